//! # Finalize
//!
//! Authoritative deletion of every declared parameter before the finalizer
//! is released.

use crate::controller::reconciler::diff::declared_keys;
use crate::controller::reconciler::status::record_error;
use crate::controller::reconciler::types::{ReconcileOutcome, Reconciler, ReconcilerError};
use crate::crd::{FailedOperation, PushEncryptedSecret};
use crate::observability;
use tracing::{error, info};

impl Reconciler {
    /// Delete all declared parameters, then remove the finalizer
    ///
    /// When the previous attempt already failed on `DELETE`, the cooldown is
    /// awaited first so a stuck deletion retries at a bounded rate.
    pub(crate) async fn finalize_deletion(
        &self,
        mut bundle: PushEncryptedSecret,
        current: &str,
    ) -> Result<ReconcileOutcome, ReconcilerError> {
        let key = bundle.resource_key();
        let keys = declared_keys(&bundle.spec.data);

        info!(
            resource.name = bundle.name(),
            resource.namespace = bundle.namespace(),
            keys = ?keys,
            "resource is being deleted"
        );

        if bundle.status_or_default().error_on_operation == FailedOperation::Delete {
            let failures = self.consecutive_failures(&key);
            self.cool_down(&bundle, FailedOperation::Delete, failures).await;
        }

        if let Err(e) = self.gateway.delete_keys(&keys).await {
            observability::metrics::increment_deletions("authoritative", "failure");
            record_error(
                self.store.as_ref(),
                &bundle,
                &e.to_string(),
                current,
                FailedOperation::Delete,
            )
            .await
            .map_err(|source| ReconcilerError::Status {
                key: key.clone(),
                source,
            })?;
            error!(
                resource.name = bundle.name(),
                resource.namespace = bundle.namespace(),
                remote_key = e.key(),
                error = %e,
                "failed to delete parameters"
            );
            return Err(ReconcilerError::Remote {
                key,
                operation: FailedOperation::Delete,
                source: e,
            });
        }
        observability::metrics::increment_deletions("authoritative", "success");

        if !bundle.remove_finalizer() {
            error!(
                resource.name = bundle.name(),
                resource.namespace = bundle.namespace(),
                "unable to remove finalizer"
            );
            return Err(ReconcilerError::FinalizerMissing { key });
        }

        self.store
            .update(&bundle)
            .await
            .map_err(|source| ReconcilerError::Finalizer {
                key: key.clone(),
                source,
            })?;

        info!(
            resource.name = bundle.name(),
            resource.namespace = bundle.namespace(),
            deleted = keys.len(),
            "resource successfully deleted"
        );
        Ok(ReconcileOutcome::Finalized)
    }
}
