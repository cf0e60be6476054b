//! Merge rules: defaults, override order, conflict handling.
//!
//! Later sources win: defaults < global file < workspace file < environment.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("salesforce.domain", "login")?
        .set_default("salesforce.api_version", "58.0")?
        .set_default("shell.default_list_size", 10_i64)?
        .set_default("shell.search_limit", 200_i64)?
        .set_default("shell.max_limit", 2000_i64)?
        .set_default("shell.history_limit", 100_i64)?
        .set_default("shell.children_limit", 50_i64)?
        .set_default("shell.search_strategy", "sosl")
}
