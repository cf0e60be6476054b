//! CLI parse: clap types for sfcli. No behavior; definitions only.

use crate::shell::parse::parse_limit;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// sfcli - browse Salesforce like a file system
#[derive(Parser)]
#[command(name = "sfcli")]
#[command(about = "Interactive Salesforce CRM navigator")]
pub struct Cli {
    /// One-shot command; omit to start the interactive shell
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Working directory holding `.env` and `sfcli.toml`
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(long, short = 'v', default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, short = 'q', default_value = "false", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the interactive shell (the default)
    Shell,
    /// Search records of an object by name
    Search {
        /// Object API name (e.g. Account)
        object: String,
        /// Search term
        #[arg(required = true, num_args = 1..)]
        term: Vec<String>,
        /// Maximum records to return
        #[arg(long, short = 'n', value_parser = parse_limit)]
        limit: Option<usize>,
        /// Comma-separated fields to return
        #[arg(long, value_delimiter = ',')]
        fields: Option<Vec<String>>,
    },
    /// Show one record by Id
    Get {
        /// Object API name
        object: String,
        /// Record Id
        id: String,
    },
    /// Run a SOQL query
    Query {
        /// SOQL text (quote it)
        #[arg(required = true, num_args = 1..)]
        soql: Vec<String>,
    },
    /// Describe an object's fields and relationships
    Describe {
        /// Object API name
        object: String,
    },
    /// List available objects
    Objects {
        /// Include every object, not only queryable and createable ones
        #[arg(long)]
        all: bool,
    },
    /// Write a `.env` credentials template into the workspace
    Init {
        /// Overwrite an existing `.env`
        #[arg(long)]
        force: bool,
    },
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Check credentials and shell settings
    Validate,
    /// Print the effective configuration (secrets masked)
    Show,
}
