//! Environment source: `.env` loading and `SF_*` credential overrides.

use crate::config::SalesforceConfig;
use std::path::Path;
use tracing::{debug, warn};

/// Credential variables read from the environment.
pub const CREDENTIAL_ENV_VARS: [&str; 7] = [
    "SF_USERNAME",
    "SF_PASSWORD",
    "SF_SECURITY_TOKEN",
    "SF_DOMAIN",
    "SF_API_VERSION",
    "SF_ACCESS_TOKEN",
    "SF_INSTANCE_URL",
];

/// Load `<dir>/.env` into the process environment. Existing variables win.
pub fn load_dotenv(dir: &Path) {
    let path = dir.join(".env");
    if !path.exists() {
        return;
    }
    match dotenvy::from_path(&path) {
        Ok(()) => debug!(path = %path.display(), "loaded .env"),
        Err(e) => warn!(path = %path.display(), error = %e, "failed to load .env"),
    }
}

/// Overlay `SF_*` variables on the file-based Salesforce settings.
///
/// `lookup` abstracts the environment so tests can supply values directly.
pub fn apply_env_overrides<F>(config: &mut SalesforceConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("SF_USERNAME") {
        config.username = Some(v);
    }
    if let Some(v) = get("SF_PASSWORD") {
        config.password = Some(v);
    }
    if let Some(v) = get("SF_SECURITY_TOKEN") {
        config.security_token = Some(v);
    }
    if let Some(v) = get("SF_DOMAIN") {
        config.domain = v;
    }
    if let Some(v) = get("SF_API_VERSION") {
        config.api_version = v;
    }
    if let Some(v) = get("SF_ACCESS_TOKEN") {
        config.access_token = Some(v);
    }
    if let Some(v) = get("SF_INSTANCE_URL") {
        config.instance_url = Some(v);
    }
}
