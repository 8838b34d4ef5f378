//! # Bundle Store
//!
//! Access to PushEncryptedSecret resources.
//!
//! `KubeBundleStore` uses `Api::replace` for metadata (finalizer) changes so
//! a stale write fails on `resourceVersion`, and a merge patch on the status
//! subresource that carries every status field.

use crate::constants::FIELD_MANAGER;
use crate::crd::{PushEncryptedSecret, PushEncryptedSecretStatus};
use async_trait::async_trait;
use kube::api::{Patch, PatchParams, PostParams};
use kube::{Api, Client};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Kube(#[from] kube::Error),
    #[error("resource store unavailable: {0}")]
    Unavailable(String),
}

/// Resource store seam used by the reconciler
#[async_trait]
pub trait BundleStore: Send + Sync {
    /// Fetch a resource; `Ok(None)` when it does not exist
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<PushEncryptedSecret>, StoreError>;

    /// Persist metadata changes (finalizers)
    async fn update(&self, bundle: &PushEncryptedSecret) -> Result<PushEncryptedSecret, StoreError>;

    /// Overwrite the status subresource in one write
    async fn update_status(
        &self,
        bundle: &PushEncryptedSecret,
        status: &PushEncryptedSecretStatus,
    ) -> Result<(), StoreError>;
}

/// Kubernetes-backed store
#[derive(Clone)]
pub struct KubeBundleStore {
    client: Client,
}

impl std::fmt::Debug for KubeBundleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeBundleStore").finish_non_exhaustive()
    }
}

impl KubeBundleStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<PushEncryptedSecret> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl BundleStore for KubeBundleStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<PushEncryptedSecret>, StoreError> {
        Ok(self.api(namespace).get_opt(name).await?)
    }

    async fn update(&self, bundle: &PushEncryptedSecret) -> Result<PushEncryptedSecret, StoreError> {
        let api = self.api(bundle.namespace());
        let updated = api
            .replace(bundle.name(), &PostParams::default(), bundle)
            .await?;
        debug!(
            resource.name = bundle.name(),
            resource.namespace = bundle.namespace(),
            "metadata updated"
        );
        Ok(updated)
    }

    async fn update_status(
        &self,
        bundle: &PushEncryptedSecret,
        status: &PushEncryptedSecretStatus,
    ) -> Result<(), StoreError> {
        let api = self.api(bundle.namespace());
        api.patch_status(
            bundle.name(),
            &PatchParams::apply(FIELD_MANAGER),
            &Patch::Merge(json!({ "status": status })),
        )
        .await?;
        debug!(
            resource.name = bundle.name(),
            resource.namespace = bundle.namespace(),
            status = status.status.as_str(),
            "status updated"
        );
        Ok(())
    }
}
