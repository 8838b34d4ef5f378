//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ```rust
//! use pushsecret_controller::prelude::*;
//! ```

// CRD types - most commonly used
pub use crate::crd::*;

// Provider seams and the gateway built on them
pub use crate::provider::{
    GatewayError, KeyManagementService, MissingKeyPolicy, ParameterStore, ProviderError,
    SecretGateway,
};

// Reconciler types - core controller functionality
pub use crate::controller::reconciler::{
    reconcile, BackoffState, BundleStore, PruneOutcome, ReconcileOutcome, Reconciler,
    ReconcilerError, StoreError,
};

pub use crate::controller::backoff::CooldownPolicy;

// Config types - for configuration management
pub use crate::config::{ConfigError, ControllerConfig, ServerConfig};

pub use crate::provider::aws::{AwsKms, AwsParameterStore};
