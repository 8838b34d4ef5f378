//! # Types
//!
//! Core types for the reconciler.

use crate::constants::{ERROR_BACKOFF_MAX_MINUTES, ERROR_BACKOFF_MIN_MINUTES};
use crate::controller::backoff::{CooldownPolicy, FibonacciBackoff};
use crate::controller::reconciler::locks::ResourceLocks;
use crate::controller::reconciler::store::{BundleStore, StoreError};
use crate::crd::FailedOperation;
use crate::provider::{GatewayError, SecretGateway};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("failed to fetch {key}: {source}")]
    Fetch {
        key: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to persist finalizer change for {key}: {source}")]
    Finalizer {
        key: String,
        #[source]
        source: StoreError,
    },
    #[error("unable to remove finalizer from {key}: not present")]
    FinalizerMissing { key: String },
    #[error("failed to write status for {key}: {source}")]
    Status {
        key: String,
        #[source]
        source: StoreError,
    },
    #[error("{operation} failed for {key}: {source}")]
    Remote {
        key: String,
        operation: FailedOperation,
        #[source]
        source: GatewayError,
    },
}

impl ReconcilerError {
    /// Short label for metrics and logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ReconcilerError::Fetch { .. } => "fetch",
            ReconcilerError::Finalizer { .. } => "finalizer",
            ReconcilerError::FinalizerMissing { .. } => "finalizer_missing",
            ReconcilerError::Status { .. } => "status",
            ReconcilerError::Remote { .. } => "remote",
        }
    }
}

/// Result of one reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Resource no longer exists, or deletion finished without our finalizer
    Gone,
    /// Finalizer added; the resulting update drives the next pass
    FinalizerAdded,
    /// All declared parameters deleted and finalizer removed
    Finalized,
    /// Nothing to publish; check again later
    UpToDate { recheck_after: Duration },
    /// Entries published to Parameter Store
    Synced { published: usize },
}

impl ReconcileOutcome {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileOutcome::Gone => "gone",
            ReconcileOutcome::FinalizerAdded => "finalizer-added",
            ReconcileOutcome::Finalized => "finalized",
            ReconcileOutcome::UpToDate { .. } => "up-to-date",
            ReconcileOutcome::Synced { .. } => "synced",
        }
    }
}

/// Result of the update-time cleanup of removed keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PruneOutcome {
    /// No declared key was removed by the update
    NothingToPrune,
    /// Removed keys deleted from Parameter Store
    Pruned { deleted: Vec<String> },
    /// Delete failed; the authoritative path retries eventually
    Failed { key: String, error: String },
}

/// Backoff state for a specific resource
/// Tracks error count and backoff calculator for progressive retries
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: FibonacciBackoff,
    pub error_count: u32,
}

impl Default for BackoffState {
    fn default() -> Self {
        Self::new()
    }
}

impl BackoffState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            backoff: FibonacciBackoff::new(ERROR_BACKOFF_MIN_MINUTES, ERROR_BACKOFF_MAX_MINUTES),
            error_count: 0,
        }
    }

    pub fn increment_error(&mut self) {
        self.error_count = self.error_count.saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.error_count = 0;
        self.backoff.reset();
    }
}

/// Reconciler context shared by every reconciliation task
pub struct Reconciler {
    pub store: Arc<dyn BundleStore>,
    pub gateway: SecretGateway,
    pub cooldown_policy: CooldownPolicy,
    // Serializes reconcile and prune for the same namespace/name
    pub locks: ResourceLocks,
    // Backoff state per resource (identified by namespace/name)
    // Written by error_policy(), read by the cooldown
    pub backoff_states: Arc<Mutex<HashMap<String, BackoffState>>>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("gateway", &self.gateway)
            .field("cooldown_policy", &self.cooldown_policy)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn BundleStore>,
        gateway: SecretGateway,
        cooldown_policy: CooldownPolicy,
    ) -> Self {
        Self {
            store,
            gateway,
            cooldown_policy,
            locks: ResourceLocks::default(),
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Failed reconciliations of `key` since its last success
    #[must_use]
    pub fn consecutive_failures(&self, key: &str) -> u32 {
        self.backoff_states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .map_or(0, |s| s.error_count)
    }

    /// Count a failure and return the next requeue delay and the new count
    pub fn record_failure(&self, key: &str) -> (Duration, u32) {
        let mut states = self
            .backoff_states
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let state = states.entry(key.to_string()).or_default();
        state.increment_error();
        (state.backoff.next_backoff(), state.error_count)
    }

    /// Forget failures of `key` after a successful pass
    pub fn reset_backoff(&self, key: &str) {
        self.backoff_states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}
