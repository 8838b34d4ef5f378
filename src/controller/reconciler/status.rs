//! # Status Recorder
//!
//! Commits the outcome of an attempt to the resource status. Each call is a
//! single write replacing all five status fields.

use crate::controller::reconciler::store::{BundleStore, StoreError};
use crate::crd::{FailedOperation, PushEncryptedSecret, PushEncryptedSecretStatus, STORE_FAILED};
use tracing::{info, warn};

/// Record `ERROR` with the failing operation and the fingerprint attempted
///
/// # Errors
///
/// Returns the store error when the status write fails.
pub async fn record_error(
    store: &dyn BundleStore,
    bundle: &PushEncryptedSecret,
    reason: &str,
    fingerprint: &str,
    operation: FailedOperation,
) -> Result<(), StoreError> {
    let status = PushEncryptedSecretStatus::error(reason, fingerprint, operation);
    store.update_status(bundle, &status).await?;
    warn!(
        resource.name = bundle.name(),
        resource.namespace = bundle.namespace(),
        operation = operation.as_str(),
        reason = reason,
        "{}", STORE_FAILED
    );
    Ok(())
}

/// Record `SUCCESS` for `fingerprint`, clearing reason and operation
///
/// # Errors
///
/// Returns the store error when the status write fails.
pub async fn record_success(
    store: &dyn BundleStore,
    bundle: &PushEncryptedSecret,
    fingerprint: &str,
) -> Result<(), StoreError> {
    let status = PushEncryptedSecretStatus::success(fingerprint);
    store.update_status(bundle, &status).await?;
    info!(
        resource.name = bundle.name(),
        resource.namespace = bundle.namespace(),
        hash = fingerprint,
        "status recorded as SUCCESS"
    );
    Ok(())
}
