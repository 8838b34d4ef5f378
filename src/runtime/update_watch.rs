//! # Update Watch
//!
//! Second watch over PushEncryptedSecret resources that feeds the update-time
//! prune. It remembers the last `spec.data` seen per resource and, when an
//! update changes it, hands the previous and current entries to
//! `Reconciler::prune_removed_keys`.
//!
//! The cache lives only in this process. A relist after a reconnect is
//! compared against it; after a restart it starts empty and first sightings
//! are never pruned.

use crate::controller::reconciler::{PruneOutcome, Reconciler};
use crate::crd::{EncryptedEntry, PushEncryptedSecret};
use futures::StreamExt;
use kube::api::Api;
use kube_runtime::watcher::{self, Event};
use kube_runtime::WatchStreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Last observed entries per `namespace/name`
#[derive(Debug, Default)]
pub struct SeenEntries {
    entries: HashMap<String, Vec<EncryptedEntry>>,
}

impl SeenEntries {
    /// Remember the entries of `bundle`
    ///
    /// Returns the previously seen entries when they differ from the current
    /// ones. The first sighting of a resource returns `None`.
    pub fn observe(&mut self, bundle: &PushEncryptedSecret) -> Option<Vec<EncryptedEntry>> {
        let previous = self
            .entries
            .insert(bundle.resource_key(), bundle.spec.data.clone())?;
        (previous != bundle.spec.data).then_some(previous)
    }

    pub fn forget(&mut self, bundle: &PushEncryptedSecret) {
        self.entries.remove(&bundle.resource_key());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Watch all resources and prune keys removed by updates
///
/// Runs until the stream ends. Each prune runs on its own task so a
/// resource held by a cooling-down reconcile does not stall the watch.
pub async fn run_update_watch(bundles: Api<PushEncryptedSecret>, reconciler: Arc<Reconciler>) {
    info!("Starting update watch for removed keys...");
    let mut seen = SeenEntries::default();
    let mut stream = watcher::watcher(bundles, watcher::Config::default())
        .default_backoff()
        .boxed();

    while let Some(event) = stream.next().await {
        match event {
            Ok(Event::Apply(bundle) | Event::InitApply(bundle)) => {
                if let Some(previous) = seen.observe(&bundle) {
                    spawn_prune(Arc::clone(&reconciler), previous, bundle);
                }
            }
            Ok(Event::Delete(bundle)) => seen.forget(&bundle),
            Ok(Event::Init | Event::InitDone) => {
                debug!(tracked = seen.len(), "update watch (re)listed resources");
            }
            Err(e) => warn!(error = %e, "update watch error, retrying with backoff"),
        }
    }

    warn!("Update watch stream ended");
}

fn spawn_prune(reconciler: Arc<Reconciler>, previous: Vec<EncryptedEntry>, bundle: PushEncryptedSecret) {
    tokio::spawn(async move {
        match reconciler.prune_removed_keys(&previous, &bundle).await {
            PruneOutcome::NothingToPrune => {}
            PruneOutcome::Pruned { deleted } => info!(
                resource.name = bundle.name(),
                resource.namespace = bundle.namespace(),
                deleted = ?deleted,
                "pruned removed keys"
            ),
            PruneOutcome::Failed { key, error } => warn!(
                resource.name = bundle.name(),
                resource.namespace = bundle.namespace(),
                remote_key = key.as_str(),
                error = error.as_str(),
                "prune failed, deletion will be retried when the resource is deleted"
            ),
        }
    });
}
