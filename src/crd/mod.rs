//! # Custom Resource Definitions
//!
//! CRD types for the PushEncryptedSecret controller.
//!
//! ## Module Structure
//!
//! - `spec.rs` - Main CRD specification and entry type
//! - `status.rs` - Status types recording the last outcome

mod spec;
mod status;

pub use spec::{EncryptedEntry, PushEncryptedSecret, PushEncryptedSecretSpec};
pub use status::{
    FailedOperation, PushEncryptedSecretStatus, SyncPhase, STORE_FAILED, STORE_SUCCESS,
};

/// Finalizer guarding removal until every declared parameter has been deleted
pub const FINALIZER: &str = "pushencryptedsecrets.io/finalizer";

/// Lifecycle phase derived from the deletion marker and finalizer presence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// Not being deleted, finalizer not yet added
    ActiveNoFinalizer,
    /// Not being deleted, finalizer present
    ActiveFinalized,
    /// Deletion requested, finalizer still present
    Deleting,
    /// Deletion requested and nothing left to clean up
    Gone,
}

impl PushEncryptedSecret {
    #[must_use]
    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or("unknown")
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        self.metadata.namespace.as_deref().unwrap_or("default")
    }

    /// Identity used for locks and per-resource state (`namespace/name`)
    #[must_use]
    pub fn resource_key(&self) -> String {
        format!("{}/{}", self.namespace(), self.name())
    }

    #[must_use]
    pub fn has_finalizer(&self) -> bool {
        self.metadata
            .finalizers
            .as_ref()
            .is_some_and(|f| f.iter().any(|x| x == FINALIZER))
    }

    /// Adds the finalizer. Returns `false` when it was already present.
    pub fn add_finalizer(&mut self) -> bool {
        if self.has_finalizer() {
            return false;
        }
        self.metadata
            .finalizers
            .get_or_insert_with(Vec::new)
            .push(FINALIZER.to_string());
        true
    }

    /// Removes the finalizer. Returns `false` when it was not present.
    pub fn remove_finalizer(&mut self) -> bool {
        let Some(finalizers) = self.metadata.finalizers.as_mut() else {
            return false;
        };
        let before = finalizers.len();
        finalizers.retain(|f| f != FINALIZER);
        before != finalizers.len()
    }

    #[must_use]
    pub fn is_being_deleted(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }

    #[must_use]
    pub fn lifecycle_phase(&self) -> LifecyclePhase {
        match (self.is_being_deleted(), self.has_finalizer()) {
            (false, false) => LifecyclePhase::ActiveNoFinalizer,
            (false, true) => LifecyclePhase::ActiveFinalized,
            (true, true) => LifecyclePhase::Deleting,
            (true, false) => LifecyclePhase::Gone,
        }
    }

    /// Status or its default when the resource has never been reconciled
    #[must_use]
    pub fn status_or_default(&self) -> PushEncryptedSecretStatus {
        self.status.clone().unwrap_or_default()
    }
}
