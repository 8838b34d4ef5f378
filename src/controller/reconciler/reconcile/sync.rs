//! # Sync
//!
//! Publishes the declared entries when the change detector asks for it.

use super::recheck_interval;
use crate::controller::reconciler::fingerprint::should_sync;
use crate::controller::reconciler::status::{record_error, record_success};
use crate::controller::reconciler::types::{ReconcileOutcome, Reconciler, ReconcilerError};
use crate::crd::{FailedOperation, PushEncryptedSecret, STORE_SUCCESS};
use crate::observability;
use tracing::{error, info};

impl Reconciler {
    /// Create or update every declared parameter
    ///
    /// A failure is recorded as `ERROR` with operation `UPDATE`, followed by a
    /// cooldown so the requeue cannot hammer AWS straight away.
    pub(crate) async fn sync(
        &self,
        bundle: &PushEncryptedSecret,
        current: &str,
    ) -> Result<ReconcileOutcome, ReconcilerError> {
        let key = bundle.resource_key();
        let status = bundle.status_or_default();

        if !should_sync(&status.hash, status.status, current) {
            info!(
                resource.name = bundle.name(),
                resource.namespace = bundle.namespace(),
                "reconcile complete, no changes"
            );
            observability::metrics::increment_syncs("skipped");
            return Ok(ReconcileOutcome::UpToDate {
                recheck_after: recheck_interval(),
            });
        }

        info!(
            resource.name = bundle.name(),
            resource.namespace = bundle.namespace(),
            entries = bundle.spec.data.len(),
            "starting create or update"
        );

        match self.gateway.decrypt_and_publish(&bundle.spec.data).await {
            Ok(published) => {
                record_success(self.store.as_ref(), bundle, current)
                    .await
                    .map_err(|source| ReconcilerError::Status {
                        key: key.clone(),
                        source,
                    })?;
                observability::metrics::increment_syncs("success");
                observability::metrics::increment_parameters_published(published);
                info!(
                    resource.name = bundle.name(),
                    resource.namespace = bundle.namespace(),
                    published,
                    "{}", STORE_SUCCESS
                );
                Ok(ReconcileOutcome::Synced { published })
            }
            Err(e) => {
                observability::metrics::increment_syncs("error");
                error!(
                    resource.name = bundle.name(),
                    resource.namespace = bundle.namespace(),
                    remote_key = e.key(),
                    error = %e,
                    "failed to create or update parameters"
                );

                record_error(
                    self.store.as_ref(),
                    bundle,
                    &e.to_string(),
                    current,
                    FailedOperation::Update,
                )
                .await
                .map_err(|source| ReconcilerError::Status {
                    key: key.clone(),
                    source,
                })?;

                let failures = self.consecutive_failures(&key).saturating_add(1);
                self.cool_down(bundle, FailedOperation::Update, failures).await;

                Err(ReconcilerError::Remote {
                    key,
                    operation: FailedOperation::Update,
                    source: e,
                })
            }
        }
    }
}
