//! Configuration System
//!
//! Layered configuration: built-in defaults, the global config file, a
//! workspace `sfcli.toml` (or an explicit `--config` file), then `SF_*`
//! environment variables for credentials. A `.env` file in the workspace is
//! loaded into the process environment before the environment layer runs.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

mod merge;
mod sources;

pub use sources::env::{apply_env_overrides, CREDENTIAL_ENV_VARS};
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SfConfig {
    /// Salesforce connection settings
    #[serde(default)]
    pub salesforce: SalesforceConfig,

    /// Interactive shell settings
    #[serde(default)]
    pub shell: ShellConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Salesforce connection settings. Usually supplied through `SF_*` variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesforceConfig {
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub security_token: Option<String>,

    /// Login domain: `login` for production, `test` for sandboxes
    #[serde(default = "default_domain")]
    pub domain: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Pre-issued OAuth access token; skips the SOAP login when set with `instance_url`
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default)]
    pub instance_url: Option<String>,
}

fn default_domain() -> String {
    "login".to_string()
}

fn default_api_version() -> String {
    "58.0".to_string()
}

impl Default for SalesforceConfig {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            security_token: None,
            domain: default_domain(),
            api_version: default_api_version(),
            access_token: None,
            instance_url: None,
        }
    }
}

impl SalesforceConfig {
    /// True when a token + instance URL pair is configured.
    pub fn has_access_token(&self) -> bool {
        is_set(&self.access_token) && is_set(&self.instance_url)
    }

    /// Names of the credential variables that are still missing.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        if self.has_access_token() {
            return Vec::new();
        }
        let mut missing = Vec::new();
        if !is_set(&self.username) {
            missing.push("SF_USERNAME");
        }
        if !is_set(&self.password) {
            missing.push("SF_PASSWORD");
        }
        if !is_set(&self.security_token) {
            missing.push("SF_SECURITY_TOKEN");
        }
        missing
    }

    /// Copy with secrets masked, for display.
    pub fn redacted(&self) -> Self {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "********".to_string());
        Self {
            password: mask(&self.password),
            security_token: mask(&self.security_token),
            access_token: mask(&self.access_token),
            ..self.clone()
        }
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}

/// How `search` finds records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// SOSL full-text search, falling back to a SOQL `LIKE` filter when it finds nothing
    Sosl,
    /// SOQL `LIKE` filter only
    Like,
}

/// Interactive shell settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Records requested by a bare `ls` in a relationship view
    #[serde(default = "default_list_size")]
    pub default_list_size: usize,

    /// Records requested by `search` without `--limit`
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// Hard cap for any requested limit; `ls --all` requests exactly this
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,

    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    #[serde(default = "default_children_limit")]
    pub children_limit: usize,

    #[serde(default = "default_search_strategy")]
    pub search_strategy: SearchStrategy,

    /// Account lookup field followed by `ultimateparent`
    #[serde(default = "default_ultimate_parent_field")]
    pub ultimate_parent_field: String,

    /// Per-object return fields for `search` (object names match case-insensitively)
    #[serde(default = "default_search_fields")]
    pub default_search_fields: HashMap<String, Vec<String>>,

    /// Print the startup banner
    #[serde(default = "default_true")]
    pub banner: bool,
}

fn default_list_size() -> usize {
    10
}

fn default_search_limit() -> usize {
    200
}

fn default_max_limit() -> usize {
    2000
}

fn default_history_limit() -> usize {
    100
}

fn default_children_limit() -> usize {
    50
}

fn default_search_strategy() -> SearchStrategy {
    SearchStrategy::Sosl
}

fn default_ultimate_parent_field() -> String {
    "Ultimate_Parent__c".to_string()
}

fn default_search_fields() -> HashMap<String, Vec<String>> {
    let mut fields = HashMap::new();
    fields.insert(
        "Account".to_string(),
        [
            "Id",
            "Name",
            "ParentId",
            "ShippingStreet",
            "ShippingCity",
            "ShippingState",
            "ShippingPostalCode",
        ]
        .iter()
        .map(|f| f.to_string())
        .collect(),
    );
    fields
}

fn default_true() -> bool {
    true
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            default_list_size: default_list_size(),
            search_limit: default_search_limit(),
            max_limit: default_max_limit(),
            history_limit: default_history_limit(),
            children_limit: default_children_limit(),
            search_strategy: default_search_strategy(),
            ultimate_parent_field: default_ultimate_parent_field(),
            default_search_fields: default_search_fields(),
            banner: default_true(),
        }
    }
}

impl ShellConfig {
    /// Configured search fields for an object, if any.
    pub fn search_fields_for(&self, object_type: &str) -> Option<&[String]> {
        self.default_search_fields
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(object_type))
            .map(|(_, fields)| fields.as_slice())
    }

    /// Clamp a requested record count to the hard cap.
    pub fn clamp_limit(&self, requested: usize) -> usize {
        requested.min(self.max_limit)
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        let limits = [
            ("default_list_size", self.default_list_size),
            ("search_limit", self.search_limit),
            ("max_limit", self.max_limit),
            ("history_limit", self.history_limit),
            ("children_limit", self.children_limit),
        ];
        for (name, value) in limits {
            if value == 0 {
                errors.push(format!("shell.{} must be greater than zero", name));
            }
        }
        if self.default_list_size > self.max_limit {
            errors.push(format!(
                "shell.default_list_size ({}) exceeds shell.max_limit ({})",
                self.default_list_size, self.max_limit
            ));
        }
        if self.search_limit > self.max_limit {
            errors.push(format!(
                "shell.search_limit ({}) exceeds shell.max_limit ({})",
                self.search_limit, self.max_limit
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingCredential(&'static str),
    Shell(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingCredential(name) => {
                write!(f, "Missing credential: {}", name)
            }
            ValidationError::Shell(msg) => write!(f, "Shell: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl SfConfig {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors: Vec<ValidationError> = self
            .salesforce
            .missing_credentials()
            .into_iter()
            .map(ValidationError::MissingCredential)
            .collect();

        if let Err(shell_errors) = self.shell.validate() {
            errors.extend(shell_errors.into_iter().map(ValidationError::Shell));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Builds `SfConfig` from the layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace directory.
    pub fn load(workspace_root: &Path) -> Result<SfConfig, ApiError> {
        sources::env::load_dotenv(workspace_root);
        let builder = merge::merge_policy::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder)?;
        let builder = sources::workspace_file::add_to_builder(builder, workspace_root)?;
        Self::finish(builder)
    }

    /// Load configuration from an explicit file, skipping global/workspace files.
    pub fn load_from_file(path: &Path) -> Result<SfConfig, ApiError> {
        if !path.exists() {
            return Err(ApiError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        if let Some(parent) = path.parent() {
            sources::env::load_dotenv(parent);
        }
        let builder = merge::merge_policy::builder_with_defaults()?
            .add_source(config::File::from(path.to_path_buf()));
        Self::finish(builder)
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<SfConfig, ApiError> {
        let mut config: SfConfig = builder.build()?.try_deserialize()?;
        apply_env_overrides(&mut config.salesforce, |key| std::env::var(key).ok());
        config.shell.validate().map_err(|errors| {
            ApiError::ConfigError(format!(
                "Invalid shell settings:\n{}",
                errors
                    .iter()
                    .map(|e| format!("  - {}", e))
                    .collect::<Vec<_>>()
                    .join("\n")
            ))
        })?;
        debug!(
            domain = %config.salesforce.domain,
            api_version = %config.salesforce.api_version,
            "configuration loaded"
        );
        Ok(config)
    }
}

const ENV_TEMPLATE: &str = "# Salesforce Credentials
SF_USERNAME=your.email@company.com
SF_PASSWORD=your_password
SF_SECURITY_TOKEN=your_security_token
# Use 'test' for sandbox, 'login' for production
SF_DOMAIN=login

# Optional Settings
# SF_API_VERSION=58.0
# SF_ACCESS_TOKEN=
# SF_INSTANCE_URL=https://yourorg.my.salesforce.com
";

/// Write a `.env` credentials template into `dir`. Refuses to overwrite unless `force`.
pub fn write_env_template(dir: &Path, force: bool) -> Result<PathBuf, ApiError> {
    let path = dir.join(".env");
    if path.exists() && !force {
        return Err(ApiError::ConfigError(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    std::fs::write(&path, ENV_TEMPLATE)?;
    Ok(path)
}
