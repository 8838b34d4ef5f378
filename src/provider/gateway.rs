//! # Secret Gateway
//!
//! Decrypt-then-put and batch delete over the injected providers.
//!
//! Both operations walk their input in order and stop at the first failure.
//! Nothing is rolled back: entries handled before the failing one stay applied.

use crate::crd::EncryptedEntry;
use crate::provider::{KeyManagementService, MissingKeyPolicy, ParameterStore, ProviderError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Failure of a gateway operation, naming the remote key it stopped at
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to decode ciphertext for {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: base64::DecodeError,
    },
    #[error("failed to decrypt {key}: {source}")]
    Decrypt {
        key: String,
        #[source]
        source: ProviderError,
    },
    #[error("decrypted value for {key} is not valid UTF-8")]
    NonUtf8Plaintext { key: String },
    #[error("failed to put parameter {key}: {source}")]
    Put {
        key: String,
        #[source]
        source: ProviderError,
    },
    #[error("failed to delete parameter {key}: {source}")]
    Delete {
        key: String,
        #[source]
        source: ProviderError,
    },
}

impl GatewayError {
    /// Remote key the operation stopped at
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            GatewayError::Decode { key, .. }
            | GatewayError::Decrypt { key, .. }
            | GatewayError::NonUtf8Plaintext { key }
            | GatewayError::Put { key, .. }
            | GatewayError::Delete { key, .. } => key,
        }
    }
}

/// Publishes decrypted entries and deletes parameters
///
/// Holds long-lived provider clients built once at startup.
#[derive(Clone)]
pub struct SecretGateway {
    kms: Arc<dyn KeyManagementService>,
    store: Arc<dyn ParameterStore>,
    key_id: String,
    missing_key_policy: MissingKeyPolicy,
}

impl std::fmt::Debug for SecretGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretGateway")
            .field("key_id", &self.key_id)
            .field("missing_key_policy", &self.missing_key_policy)
            .finish_non_exhaustive()
    }
}

impl SecretGateway {
    pub fn new(
        kms: Arc<dyn KeyManagementService>,
        store: Arc<dyn ParameterStore>,
        key_id: impl Into<String>,
        missing_key_policy: MissingKeyPolicy,
    ) -> Self {
        Self {
            kms,
            store,
            key_id: key_id.into(),
            missing_key_policy,
        }
    }

    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Decrypt each entry and write it as a `SecureString`, in order
    ///
    /// Returns the number of parameters written.
    ///
    /// # Errors
    ///
    /// Returns the first decode, decrypt, UTF-8 or put failure.
    pub async fn decrypt_and_publish(&self, entries: &[EncryptedEntry]) -> Result<usize, GatewayError> {
        for entry in entries {
            let key = &entry.remote_ref_key;
            let encoded: String = entry
                .encrypted_secret
                .chars()
                .filter(|c| !matches!(c, '\r' | '\n'))
                .collect();
            let ciphertext = STANDARD
                .decode(encoded)
                .map_err(|source| GatewayError::Decode {
                    key: key.clone(),
                    source,
                })?;

            let plaintext = self
                .kms
                .decrypt(&ciphertext, &self.key_id)
                .await
                .map_err(|source| GatewayError::Decrypt {
                    key: key.clone(),
                    source,
                })?;

            let value = std::str::from_utf8(&plaintext)
                .map_err(|_utf8| GatewayError::NonUtf8Plaintext { key: key.clone() })?;

            self.store
                .put_secure_string(key, value, &self.key_id)
                .await
                .map_err(|source| GatewayError::Put {
                    key: key.clone(),
                    source,
                })?;

            debug!(remote_key = key.as_str(), "parameter published");
        }

        info!(count = entries.len(), "published entries to Parameter Store");
        Ok(entries.len())
    }

    /// Delete each parameter, in order
    ///
    /// Returns the number of keys processed.
    ///
    /// # Errors
    ///
    /// Returns the first delete failure. A missing parameter is a failure
    /// unless the missing key policy is `Ignore`.
    pub async fn delete_keys(&self, keys: &[String]) -> Result<usize, GatewayError> {
        for key in keys {
            match self.store.delete(key).await {
                Ok(()) => debug!(remote_key = key.as_str(), "parameter deleted"),
                Err(e) if e.is_not_found() && self.missing_key_policy == MissingKeyPolicy::Ignore => {
                    warn!(remote_key = key.as_str(), "parameter already absent, treating as deleted");
                }
                Err(source) => {
                    return Err(GatewayError::Delete {
                        key: key.clone(),
                        source,
                    });
                }
            }
        }

        info!(count = keys.len(), "deleted parameters from Parameter Store");
        Ok(keys.len())
    }
}
