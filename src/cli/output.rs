//! CLI output: error mapping from domain errors to the user-facing message.

use crate::error::ApiError;
use crate::presentation::error;

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    error(&e.to_string())
}
