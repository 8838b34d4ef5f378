//! # Configuration
//!
//! Controller and server settings loaded from environment variables.
//!
//! Environment variables are populated from a ConfigMap using `envFrom` in
//! the deployment. Only `KMS_KEY_ID` is required; everything else has a
//! default.

mod controller;
mod server;

pub use controller::{ConfigError, ControllerConfig};
pub use server::ServerConfig;

/// Load configuration from environment variables
///
/// # Errors
///
/// Fails when `KMS_KEY_ID` is missing or a policy value is not recognized.
pub fn load_config() -> Result<(ControllerConfig, ServerConfig), ConfigError> {
    Ok((ControllerConfig::from_env()?, ServerConfig::from_env()))
}

/// Read environment variable or return default value
pub(crate) fn env_var_or_default<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Process environment lookup, treating empty values as unset
pub(crate) fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
