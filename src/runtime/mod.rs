//! # Runtime
//!
//! Controller runtime: startup, the watch loops and error policies.
//!
//! - `initialization`: clients, configuration, tracing, metrics and probe server
//! - `watch_loop`: kube-runtime controller driving reconciliation
//! - `update_watch`: prunes keys removed by updates
//! - `error_policy`: requeue backoff and watch error classification

pub mod error_policy;
pub mod initialization;
pub mod update_watch;
pub mod watch_loop;

pub use initialization::{initialize, InitializationResult, RuntimeOverrides};
pub use watch_loop::run_watch_loop;
