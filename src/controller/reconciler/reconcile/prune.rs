//! # Prune
//!
//! Update-time cleanup of parameters whose keys were dropped from `spec.data`.
//!
//! Best effort: failures are logged and reported as an outcome, never as an
//! error. The deletion flow catches anything left behind.

use crate::controller::reconciler::diff::keys_to_delete;
use crate::controller::reconciler::fingerprint::fingerprint;
use crate::controller::reconciler::status::record_success;
use crate::controller::reconciler::types::{PruneOutcome, Reconciler};
use crate::crd::{EncryptedEntry, PushEncryptedSecret, SyncPhase};
use crate::observability;
use tracing::{info, warn};

impl Reconciler {
    /// Delete parameters for keys present in `old` but absent from `new`
    ///
    /// The resource is re-read under its lock so a key re-added by a later
    /// update is never deleted. After a successful delete the status is
    /// marked `SUCCESS` with the hash already stored, which leaves the next
    /// sync free to publish any keys the update added. An `ERROR` status is
    /// left as recorded.
    pub async fn prune_removed_keys(&self, old: &[EncryptedEntry], new: &PushEncryptedSecret) -> PruneOutcome {
        if keys_to_delete(old, &new.spec.data).is_empty() {
            return PruneOutcome::NothingToPrune;
        }

        let key = new.resource_key();
        let _guard = self.locks.acquire(&key).await;

        let current = match self.store.get(new.namespace(), new.name()).await {
            Ok(current) => current,
            Err(e) => {
                warn!(
                    resource.name = new.name(),
                    resource.namespace = new.namespace(),
                    error = %e,
                    "unable to re-read resource, pruning against the observed update"
                );
                None
            }
        };

        let declared = current.as_ref().map_or(&new.spec.data, |c| &c.spec.data);
        let removed = keys_to_delete(old, declared);
        if removed.is_empty() {
            return PruneOutcome::NothingToPrune;
        }

        if let Err(e) = self.gateway.delete_keys(&removed).await {
            observability::metrics::increment_deletions("opportunistic", "failure");
            warn!(
                resource.name = new.name(),
                resource.namespace = new.namespace(),
                remote_key = e.key(),
                error = %e,
                "error deleting removed parameters on update"
            );
            return PruneOutcome::Failed {
                key: e.key().to_string(),
                error: e.to_string(),
            };
        }
        observability::metrics::increment_deletions("opportunistic", "success");

        info!(
            resource.name = new.name(),
            resource.namespace = new.namespace(),
            keys = ?removed,
            "deleted removed parameters on resource update"
        );

        if let Some(current) = current.filter(|c| !c.is_being_deleted()) {
            let status = current.status_or_default();
            if status.status != SyncPhase::Error && status.hash != fingerprint(&current.spec.data) {
                if let Err(e) = record_success(self.store.as_ref(), &current, &status.hash).await {
                    warn!(
                        resource.name = current.name(),
                        resource.namespace = current.namespace(),
                        error = %e,
                        "failed to record status after pruning"
                    );
                }
            }
        }

        PruneOutcome::Pruned { deleted: removed }
    }
}
