//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! Defaults listed here can be overridden via environment variables where a
//! matching configuration field exists. The recheck interval and failure
//! cooldown are fixed and are not read from the environment.

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default HTTP server startup timeout (how long to wait for server to be ready)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Periodic re-check interval once a bundle is in sync (seconds)
pub const RECHECK_INTERVAL_SECS: u64 = 60;

/// Cooldown applied after a failed publish and before retrying a failed delete (seconds)
pub const FAILURE_COOLDOWN_SECS: u64 = 60;

/// Upper bound for the exponential cooldown policy (seconds)
pub const MAX_COOLDOWN_SECS: u64 = 600;

/// Fibonacci backoff floor for reconciliation errors (minutes)
pub const ERROR_BACKOFF_MIN_MINUTES: u64 = 1;

/// Fibonacci backoff ceiling for reconciliation errors (minutes)
pub const ERROR_BACKOFF_MAX_MINUTES: u64 = 10;

/// Default exponential backoff starting value for watch restarts (milliseconds)
pub const DEFAULT_BACKOFF_START_MS: u64 = 1000;

/// Default exponential backoff maximum value for watch restarts (milliseconds)
pub const DEFAULT_BACKOFF_MAX_MS: u64 = 30_000;

/// Default delay before restarting watch stream after unknown errors (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_SECS: u64 = 5;

/// Default delay before restarting watch stream after it ends (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS: u64 = 1;

/// Environment variable holding the KMS key identifier
pub const KMS_KEY_ID_ENV: &str = "KMS_KEY_ID";

/// Field manager used for status and metadata writes
pub const FIELD_MANAGER: &str = "pushsecret-controller";

/// Default tracing filter when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "pushsecret_controller=info";
