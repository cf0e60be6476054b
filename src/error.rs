//! Error types for the sfcli shell.
//!
//! Three failure families reach the user: bad input, invalid navigation and
//! remote CRM failures. All of them are reported inline by the shell; only
//! configuration and startup authentication errors end the process.

use thiserror::Error;

/// User input errors: unknown verbs, malformed arguments.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Unknown command: {0}. Type 'help' for available commands.")]
    UnknownCommand(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Invalid limit: {0} (must be a positive number)")]
    InvalidLimit(String),

    #[error("Invalid identifier: '{0}' (letters, digits, '_' and '.' only)")]
    InvalidIdentifier(String),

    #[error("Invalid sort order: {0}. Use -desc or -asc")]
    InvalidSortOrder(String),

    #[error("Only 'sort' is supported after '|'. Usage: ls | sort <Field> [-desc|-asc]")]
    UnsupportedPipe,

    #[error("Unterminated quote in input")]
    UnterminatedQuote,
}

/// Navigation errors: the requested move is not valid from the current context.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("No record selected. Use 'search' or 'get' first.")]
    NoRecordSelected,

    #[error("No records to select from. Use 'search' first.")]
    NothingToSelect,

    #[error("Invalid selection {index}. Choose a number between 1 and {len}")]
    SelectionOutOfRange { index: usize, len: usize },

    #[error("Unknown relationship '{name}' on {object}. Use 'relationships' to list them.")]
    UnknownRelationship { object: String, name: String },

    #[error("Could not determine the field linking {child} to {parent}")]
    UnresolvedLinkField { parent: String, child: String },

    #[error("'{command}' only works for Account records (current: {object})")]
    AccountOnly {
        command: &'static str,
        object: String,
    },

    #[error("Field '{0}' not found in current record. Use 'fields' to list them.")]
    UnknownField(String),

    #[error("Field '{field}' not found in records. Available fields: {available}")]
    UnknownSortField { field: String, available: String },
}

/// Remote CRM errors: transport, authentication, API failures.
#[derive(Debug, Error)]
pub enum CrmError {
    #[error("Salesforce authentication failed: {0}")]
    AuthFailed(String),

    #[error("Salesforce session expired or invalid: {0}")]
    SessionExpired(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Salesforce request failed: {0}")]
    Request(String),

    #[error("Connection error: {0}")]
    Transport(String),

    #[error("Unexpected response from Salesforce: {0}")]
    InvalidResponse(String),
}

/// Top-level error returned by sessions, CLI routes and configuration loading.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error(transparent)]
    Crm(#[from] CrmError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// True for failures that make the session unusable (bad credentials).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ApiError::Crm(CrmError::AuthFailed(_)) | ApiError::ConfigError(_)
        )
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
