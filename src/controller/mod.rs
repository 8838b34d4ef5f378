//! # Controller
//!
//! Core controller modules for the PushEncryptedSecret controller.
//!
//! - `backoff`: Fibonacci backoff and cooldown policies
//! - `reconciler`: Core reconciliation logic
//! - `server`: HTTP server for metrics and health checks

pub mod backoff;
pub mod reconciler;
pub mod server;
