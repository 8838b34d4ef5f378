//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use super::{env_var_or_default, process_env};
use crate::constants::{
    DEFAULT_BACKOFF_MAX_MS, DEFAULT_BACKOFF_START_MS, DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS,
    DEFAULT_WATCH_RESTART_DELAY_SECS, KMS_KEY_ID_ENV,
};
use crate::controller::backoff::CooldownPolicy;
use crate::provider::MissingKeyPolicy;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Controller-level configuration
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// KMS key used for Decrypt and as the SecureString encryption key
    pub kms_key_id: String,
    /// AWS region; falls back to the SDK default chain when unset
    pub aws_region: Option<String>,
    /// KMS endpoint override (local stacks)
    pub kms_endpoint_url: Option<String>,
    /// SSM endpoint override (local stacks)
    pub ssm_endpoint_url: Option<String>,
    /// Cooldown applied around failed publishes and retried deletes
    pub cooldown_policy: CooldownPolicy,
    /// Treatment of already-absent parameters on delete
    pub missing_key_policy: MissingKeyPolicy,
    /// Exponential backoff starting value (milliseconds)
    /// Initial delay before restarting the watch after a 429
    pub backoff_start_ms: u64,
    /// Exponential backoff maximum value (milliseconds)
    pub backoff_max_ms: u64,
    /// Watch stream restart delay after unknown errors (seconds)
    pub watch_restart_delay_secs: u64,
    /// Watch stream restart delay after stream ends (seconds)
    pub watch_restart_delay_after_end_secs: u64,
    /// Global log level used when `RUST_LOG` is not set
    pub log_level: String,
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    ///
    /// # Errors
    ///
    /// Fails when `KMS_KEY_ID` is missing or a policy value is not recognized.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    /// Load configuration from an arbitrary variable source
    ///
    /// # Errors
    ///
    /// Same as [`ControllerConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let kms_key_id = lookup(KMS_KEY_ID_ENV).ok_or(ConfigError::Missing(KMS_KEY_ID_ENV))?;

        let cooldown_policy = match lookup("COOLDOWN_POLICY") {
            Some(raw) => raw.parse::<CooldownPolicy>().map_err(|message| ConfigError::Invalid {
                key: "COOLDOWN_POLICY",
                message,
            })?,
            None => CooldownPolicy::default(),
        };

        let missing_key_policy = match lookup("DELETE_MISSING_KEY_POLICY") {
            Some(raw) => raw.parse::<MissingKeyPolicy>().map_err(|message| ConfigError::Invalid {
                key: "DELETE_MISSING_KEY_POLICY",
                message,
            })?,
            None => MissingKeyPolicy::default(),
        };

        Ok(Self {
            kms_key_id,
            aws_region: lookup("AWS_REGION"),
            kms_endpoint_url: lookup("KMS_ENDPOINT_URL"),
            ssm_endpoint_url: lookup("SSM_ENDPOINT_URL"),
            cooldown_policy,
            missing_key_policy,
            backoff_start_ms: env_var_or_default(&lookup, "BACKOFF_START_MS", DEFAULT_BACKOFF_START_MS),
            backoff_max_ms: env_var_or_default(&lookup, "BACKOFF_MAX_MS", DEFAULT_BACKOFF_MAX_MS),
            watch_restart_delay_secs: env_var_or_default(
                &lookup,
                "WATCH_RESTART_DELAY_SECS",
                DEFAULT_WATCH_RESTART_DELAY_SECS,
            ),
            watch_restart_delay_after_end_secs: env_var_or_default(
                &lookup,
                "WATCH_RESTART_DELAY_AFTER_END_SECS",
                DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS,
            ),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Get watch restart delay duration
    #[must_use]
    pub fn watch_restart_delay_duration(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_secs)
    }

    /// Get watch restart delay after end duration
    #[must_use]
    pub fn watch_restart_delay_after_end_duration(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_after_end_secs)
    }
}
