//! CLI command-name contract for logging and routing.

use crate::cli::parse::{Commands, ConfigCommands};

/// Command name string for log records (e.g. "search", "config.validate").
pub fn command_name(command: &Commands) -> String {
    match command {
        Commands::Shell => "shell".to_string(),
        Commands::Search { .. } => "search".to_string(),
        Commands::Get { .. } => "get".to_string(),
        Commands::Query { .. } => "query".to_string(),
        Commands::Describe { .. } => "describe".to_string(),
        Commands::Objects { .. } => "objects".to_string(),
        Commands::Init { .. } => "init".to_string(),
        Commands::Config { command } => format!("config.{}", config_command_name(command)),
    }
}

pub fn config_command_name(command: &ConfigCommands) -> &'static str {
    match command {
        ConfigCommands::Validate => "validate",
        ConfigCommands::Show => "show",
    }
}
