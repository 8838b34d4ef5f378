//! # Provider Modules
//!
//! Seams to the two remote services the controller consumes:
//! - `KeyManagementService` decrypts ciphertext produced upstream
//! - `ParameterStore` writes and removes `SecureString` parameters
//!
//! `SecretGateway` composes both into the publish and delete operations used
//! by the reconciler.

use async_trait::async_trait;
use thiserror::Error;
use zeroize::Zeroizing;

pub mod aws;
pub mod gateway;

pub use gateway::{GatewayError, SecretGateway};

/// Error returned by a provider call
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The remote object (key or parameter) does not exist
    #[error("{operation}: {name} not found")]
    NotFound {
        operation: &'static str,
        name: String,
    },
    /// Any other service or transport failure
    #[error("{operation} failed: {message}")]
    Service {
        operation: &'static str,
        message: String,
    },
}

impl ProviderError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound { .. })
    }
}

/// Envelope-encryption key management service
#[async_trait]
pub trait KeyManagementService: Send + Sync {
    /// Decrypt `ciphertext` with the symmetric key `key_id`
    async fn decrypt(
        &self,
        ciphertext: &[u8],
        key_id: &str,
    ) -> Result<Zeroizing<Vec<u8>>, ProviderError>;
}

/// Key-value parameter store
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Write `value` as a `SecureString` encrypted with `key_id`, overwriting any existing value
    async fn put_secure_string(
        &self,
        name: &str,
        value: &str,
        key_id: &str,
    ) -> Result<(), ProviderError>;

    /// Delete the parameter `name`
    async fn delete(&self, name: &str) -> Result<(), ProviderError>;
}

/// How a delete of an already-absent parameter is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingKeyPolicy {
    /// Report the missing parameter as a delete failure
    #[default]
    Fail,
    /// Treat a missing parameter as already deleted
    Ignore,
}

impl std::str::FromStr for MissingKeyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fail" => Ok(MissingKeyPolicy::Fail),
            "ignore" => Ok(MissingKeyPolicy::Ignore),
            other => Err(format!(
                "unknown missing key policy '{other}', expected 'fail' or 'ignore'"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_policy_parses() {
        assert_eq!("fail".parse::<MissingKeyPolicy>(), Ok(MissingKeyPolicy::Fail));
        assert_eq!(" Ignore ".parse::<MissingKeyPolicy>(), Ok(MissingKeyPolicy::Ignore));
        assert!("skip".parse::<MissingKeyPolicy>().is_err());
    }

    #[test]
    fn test_missing_key_policy_defaults_to_fail() {
        assert_eq!(MissingKeyPolicy::default(), MissingKeyPolicy::Fail);
    }

    #[test]
    fn test_provider_error_not_found() {
        let err = ProviderError::NotFound {
            operation: "DeleteParameter",
            name: "/app/k1".to_string(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "DeleteParameter: /app/k1 not found");
    }
}
