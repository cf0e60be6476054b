//! CLI route: single route table and run context. Dispatches to the shell session and config.

use crate::cli::command_name;
use crate::cli::parse::{Commands, ConfigCommands};
use crate::config::{write_env_template, ConfigLoader, SfConfig};
use crate::crm::SalesforceClient;
use crate::error::ApiError;
use crate::presentation::{info, success};
use crate::shell::parse::SearchArgs;
use crate::shell::{repl, Command, Outcome, Session};
use std::path::PathBuf;
use tracing::{debug, info as log_info};

/// Runtime context for CLI execution: workspace and loaded configuration.
pub struct RunContext {
    workspace_root: PathBuf,
    config_path: Option<PathBuf>,
    config: SfConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        Ok(Self {
            workspace_root,
            config_path,
            config,
        })
    }

    pub fn config(&self) -> &SfConfig {
        &self.config
    }

    /// Log in and open a shell session. Credential and login failures are fatal.
    pub fn connect(&self) -> Result<Session, ApiError> {
        let client = SalesforceClient::connect(&self.config.salesforce)?;
        Ok(Session::new(Box::new(client), self.config.shell.clone()))
    }

    /// Run the interactive shell until the user exits.
    pub fn run_shell(&self) -> Result<(), ApiError> {
        let mut session = self.connect()?;
        repl::run(&mut session, self.config.shell.banner)
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        debug!(command = %command_name(command), "executing");
        match command {
            Commands::Shell => {
                self.run_shell()?;
                Ok(String::new())
            }
            Commands::Init { force } => self.handle_init(*force),
            Commands::Config { command } => self.handle_config(command),
            _ => match shell_command(command) {
                Some(shell_command) => {
                    let mut session = self.connect()?;
                    run_one_shot(&mut session, shell_command)
                }
                None => Ok(String::new()),
            },
        }
    }

    fn handle_init(&self, force: bool) -> Result<String, ApiError> {
        let path = write_env_template(&self.workspace_root, force)?;
        log_info!(path = %path.display(), "wrote credentials template");
        Ok(format!(
            "{}\n{}",
            success(&format!("Created {}", path.display())),
            info("Fill in your Salesforce credentials, then run 'sfcli'.")
        ))
    }

    fn handle_config(&self, command: &ConfigCommands) -> Result<String, ApiError> {
        match command {
            ConfigCommands::Validate => match self.config.validate() {
                Ok(()) => Ok(success("Configuration is valid")),
                Err(errors) => {
                    let lines: Vec<String> =
                        errors.iter().map(|e| format!("  - {}", e)).collect();
                    Err(ApiError::ConfigError(format!(
                        "{} problem(s) found:\n{}",
                        errors.len(),
                        lines.join("\n")
                    )))
                }
            },
            ConfigCommands::Show => {
                let shown = SfConfig {
                    salesforce: self.config.salesforce.redacted(),
                    ..self.config.clone()
                };
                let body = toml::to_string_pretty(&shown).map_err(|e| {
                    ApiError::ConfigError(format!("Failed to render configuration: {}", e))
                })?;
                let source = match &self.config_path {
                    Some(path) => path.display().to_string(),
                    None => format!("layered (workspace {})", self.workspace_root.display()),
                };
                Ok(format!("# source: {}\n{}", source, body.trim_end()))
            }
        }
    }
}

/// The shell command a one-shot CLI command runs, if any.
pub fn shell_command(command: &Commands) -> Option<Command> {
    match command {
        Commands::Search {
            object,
            term,
            limit,
            fields,
        } => Some(Command::Search(SearchArgs {
            object_type: object.clone(),
            term: term.join(" "),
            limit: *limit,
            fields: fields.clone(),
            match_fields: None,
        })),
        Commands::Get { object, id } => Some(Command::Get {
            object_type: object.clone(),
            record_id: id.clone(),
        }),
        Commands::Query { soql } => Some(Command::Query {
            soql: soql.join(" "),
        }),
        Commands::Describe { object } => Some(Command::Describe {
            object_type: Some(object.clone()),
        }),
        Commands::Objects { all } => Some(Command::Objects { all: *all }),
        Commands::Shell | Commands::Init { .. } | Commands::Config { .. } => None,
    }
}

/// Run one shell command against a session and return its output.
pub fn run_one_shot(session: &mut Session, command: Command) -> Result<String, ApiError> {
    match session.execute(command)? {
        Outcome::Output(text) => Ok(text),
        Outcome::Exit => Ok(String::new()),
    }
}
