//! # Reconciliation Logic
//!
//! Lifecycle flow for PushEncryptedSecret resources.
//!
//! Each pass holds the per-resource lock, fetches the current resource and
//! dispatches on its lifecycle phase:
//!
//! - **ActiveNoFinalizer**: add the finalizer and stop; the update drives the next pass
//! - **ActiveFinalized**: publish entries when the fingerprint or phase calls for it
//! - **Deleting**: delete every declared parameter, then release the finalizer
//! - **Gone**: nothing to do

mod finalize;
mod prune;
mod sync;

use crate::constants::RECHECK_INTERVAL_SECS;
use crate::controller::reconciler::fingerprint::fingerprint;
use crate::controller::reconciler::types::{ReconcileOutcome, Reconciler, ReconcilerError};
use crate::crd::{FailedOperation, LifecyclePhase, PushEncryptedSecret};
use crate::observability;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, Instrument};

impl Reconciler {
    /// Run one reconciliation pass for `namespace/name`
    ///
    /// # Errors
    ///
    /// Fetch, persistence and remote failures are returned so the caller can
    /// requeue with backoff. Remote failures are recorded in the status first.
    pub async fn reconcile(&self, namespace: &str, name: &str) -> Result<ReconcileOutcome, ReconcilerError> {
        let key = format!("{namespace}/{name}");
        let guard = self.locks.acquire(&key).await;

        let fetched = self
            .store
            .get(namespace, name)
            .await
            .map_err(|source| ReconcilerError::Fetch {
                key: key.clone(),
                source,
            })?;

        let Some(mut bundle) = fetched else {
            info!(
                resource.name = name,
                resource.namespace = namespace,
                "resource not found, must have been deleted"
            );
            drop(guard);
            self.locks.forget(&key);
            return Ok(ReconcileOutcome::Gone);
        };

        let current = fingerprint(&bundle.spec.data);

        match bundle.lifecycle_phase() {
            LifecyclePhase::ActiveNoFinalizer => {
                bundle.add_finalizer();
                self.store
                    .update(&bundle)
                    .await
                    .map_err(|source| ReconcilerError::Finalizer {
                        key: key.clone(),
                        source,
                    })?;
                info!(
                    resource.name = name,
                    resource.namespace = namespace,
                    "added finalizer"
                );
                Ok(ReconcileOutcome::FinalizerAdded)
            }
            LifecyclePhase::ActiveFinalized => self.sync(&bundle, &current).await,
            LifecyclePhase::Deleting => self.finalize_deletion(bundle, &current).await,
            LifecyclePhase::Gone => {
                debug!(
                    resource.name = name,
                    resource.namespace = namespace,
                    "deletion requested without our finalizer, nothing to clean up"
                );
                Ok(ReconcileOutcome::Gone)
            }
        }
    }

    /// Park the reconciling task for the cooldown of `operation`
    ///
    /// `consecutive_failures` of 0 is treated as a first failure.
    pub(crate) async fn cool_down(&self, bundle: &PushEncryptedSecret, operation: FailedOperation, consecutive_failures: u32) {
        let delay = self.cooldown_policy.cooldown(consecutive_failures);
        observability::metrics::increment_cooldowns(operation.as_str());
        info!(
            resource.name = bundle.name(),
            resource.namespace = bundle.namespace(),
            operation = operation.as_str(),
            policy = self.cooldown_policy.name(),
            cooldown_secs = delay.as_secs(),
            "cooling down before touching Parameter Store again"
        );
        tokio::time::sleep(delay).await;
    }
}

/// Map a pass outcome to the controller's next action
#[must_use]
pub fn action_for(outcome: &ReconcileOutcome) -> Action {
    match outcome {
        ReconcileOutcome::UpToDate { recheck_after } => {
            observability::metrics::increment_requeues_total("periodic-recheck");
            Action::requeue(*recheck_after)
        }
        ReconcileOutcome::Gone
        | ReconcileOutcome::FinalizerAdded
        | ReconcileOutcome::Finalized
        | ReconcileOutcome::Synced { .. } => Action::await_change(),
    }
}

/// Periodic recheck for resources that are already in sync
#[must_use]
pub fn recheck_interval() -> Duration {
    Duration::from_secs(RECHECK_INTERVAL_SECS)
}

/// Main reconciliation function
///
/// Errors are handled by `error_policy` in the runtime, which owns the
/// per-resource backoff. A successful pass resets that backoff.
pub async fn reconcile(
    obj: Arc<PushEncryptedSecret>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let start = Instant::now();
    let name = obj.name().to_string();
    let namespace = obj.namespace().to_string();

    let span = tracing::span!(
        tracing::Level::INFO,
        "reconcile",
        resource.name = name.as_str(),
        resource.namespace = namespace.as_str(),
        resource.kind = "PushEncryptedSecret",
        resource.entries = obj.spec.data.len()
    );

    observability::metrics::increment_reconciliations();

    let result = ctx.reconcile(&namespace, &name).instrument(span).await;
    observability::metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());

    let outcome = result?;
    ctx.reset_backoff(&obj.resource_key());
    debug!(
        resource.name = name.as_str(),
        resource.namespace = namespace.as_str(),
        outcome = outcome.as_str(),
        "reconciliation finished"
    );
    Ok(action_for(&outcome))
}
