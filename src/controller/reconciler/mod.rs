//! # Reconciler
//!
//! Core reconciliation logic for `PushEncryptedSecret` resources.
//!
//! The reconciler:
//! - Adds a finalizer before any parameter is written
//! - Decrypts each entry with KMS and writes it to Parameter Store as a `SecureString`
//! - Skips work when the entry fingerprint is unchanged and the last attempt succeeded
//! - Deletes removed keys as soon as an update is observed
//! - Deletes every declared parameter before releasing the finalizer
//! - Records the outcome of each attempt in the resource status

pub mod diff;
pub mod fingerprint;
pub mod locks;
pub mod reconcile;
pub mod status;
pub mod store;
pub mod types;

// Re-export public API
pub use reconcile::{action_for, reconcile};
pub use store::{BundleStore, KubeBundleStore, StoreError};
pub use types::{BackoffState, PruneOutcome, ReconcileOutcome, Reconciler, ReconcilerError};
