//! # AWS KMS Client
//!
//! Decrypts ciphertext blobs with `SYMMETRIC_DEFAULT`.

use crate::observability::metrics;
use crate::provider::{KeyManagementService, ProviderError};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_kms::error::DisplayErrorContext;
use aws_sdk_kms::primitives::Blob;
use aws_sdk_kms::types::EncryptionAlgorithmSpec;
use aws_sdk_kms::Client as KmsClient;
use std::time::Instant;
use tracing::{debug, info};
use zeroize::Zeroizing;

const OPERATION: &str = "kms_decrypt";

/// AWS KMS provider implementation
pub struct AwsKms {
    client: KmsClient,
}

impl std::fmt::Debug for AwsKms {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsKms").finish_non_exhaustive()
    }
}

impl AwsKms {
    #[must_use]
    pub fn new(sdk_config: &SdkConfig, endpoint_url: Option<&str>) -> Self {
        let mut builder = aws_sdk_kms::config::Builder::from(sdk_config);
        if let Some(url) = endpoint_url {
            info!("Using KMS endpoint override: {}", url);
            builder = builder.endpoint_url(url);
        }
        Self {
            client: KmsClient::from_conf(builder.build()),
        }
    }
}

#[async_trait]
impl KeyManagementService for AwsKms {
    async fn decrypt(
        &self,
        ciphertext: &[u8],
        key_id: &str,
    ) -> Result<Zeroizing<Vec<u8>>, ProviderError> {
        let start = Instant::now();
        let result = self
            .client
            .decrypt()
            .ciphertext_blob(Blob::new(ciphertext.to_vec()))
            .key_id(key_id)
            .encryption_algorithm(EncryptionAlgorithmSpec::SymmetricDefault)
            .send()
            .await;
        let elapsed = start.elapsed().as_secs_f64();

        match result {
            Ok(output) => {
                let Some(plaintext) = output.plaintext() else {
                    metrics::record_remote_operation(OPERATION, "error", elapsed);
                    return Err(ProviderError::Service {
                        operation: "Decrypt",
                        message: "response carried no plaintext".to_string(),
                    });
                };
                metrics::record_remote_operation(OPERATION, "success", elapsed);
                debug!("KMS decrypt succeeded in {:.3}s", elapsed);
                Ok(Zeroizing::new(plaintext.as_ref().to_vec()))
            }
            Err(e) => {
                if e.as_service_error().is_some_and(|s| s.is_not_found_exception()) {
                    metrics::record_remote_operation(OPERATION, "not_found", elapsed);
                    return Err(ProviderError::NotFound {
                        operation: "Decrypt",
                        name: key_id.to_string(),
                    });
                }
                metrics::record_remote_operation(OPERATION, "error", elapsed);
                Err(ProviderError::Service {
                    operation: "Decrypt",
                    message: DisplayErrorContext(&e).to_string(),
                })
            }
        }
    }
}
