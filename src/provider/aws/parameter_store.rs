//! # AWS Parameter Store Client
//!
//! Client for interacting with AWS Systems Manager Parameter Store API.
//!
//! Values are always written as `SecureString` with `Overwrite=true`, so a
//! put is an upsert and last writer wins.

use crate::observability::metrics;
use crate::provider::{ParameterStore, ProviderError};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ssm::error::DisplayErrorContext;
use aws_sdk_ssm::types::ParameterType;
use aws_sdk_ssm::Client as SsmClient;
use std::time::Instant;
use tracing::info;

/// AWS Parameter Store provider implementation
pub struct AwsParameterStore {
    client: SsmClient,
}

impl std::fmt::Debug for AwsParameterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsParameterStore").finish_non_exhaustive()
    }
}

impl AwsParameterStore {
    #[must_use]
    pub fn new(sdk_config: &SdkConfig, endpoint_url: Option<&str>) -> Self {
        let mut builder = aws_sdk_ssm::config::Builder::from(sdk_config);
        if let Some(url) = endpoint_url {
            info!("Using SSM endpoint override: {}", url);
            builder = builder.endpoint_url(url);
        }
        Self {
            client: SsmClient::from_conf(builder.build()),
        }
    }
}

#[async_trait]
impl ParameterStore for AwsParameterStore {
    async fn put_secure_string(
        &self,
        name: &str,
        value: &str,
        key_id: &str,
    ) -> Result<(), ProviderError> {
        let start = Instant::now();
        info!("Putting AWS Parameter Store parameter: {}", name);
        let result = self
            .client
            .put_parameter()
            .name(name)
            .value(value)
            .key_id(key_id)
            .r#type(ParameterType::SecureString)
            .overwrite(true)
            .send()
            .await;
        let elapsed = start.elapsed().as_secs_f64();

        match result {
            Ok(_) => {
                metrics::record_remote_operation("ssm_put_parameter", "success", elapsed);
                Ok(())
            }
            Err(e) => {
                metrics::record_remote_operation("ssm_put_parameter", "error", elapsed);
                Err(ProviderError::Service {
                    operation: "PutParameter",
                    message: DisplayErrorContext(&e).to_string(),
                })
            }
        }
    }

    async fn delete(&self, name: &str) -> Result<(), ProviderError> {
        let start = Instant::now();
        info!("Deleting AWS Parameter Store parameter: {}", name);
        let result = self.client.delete_parameter().name(name).send().await;
        let elapsed = start.elapsed().as_secs_f64();

        match result {
            Ok(_) => {
                metrics::record_remote_operation("ssm_delete_parameter", "success", elapsed);
                Ok(())
            }
            Err(e) if e.as_service_error().is_some_and(|s| s.is_parameter_not_found()) => {
                metrics::record_remote_operation("ssm_delete_parameter", "not_found", elapsed);
                Err(ProviderError::NotFound {
                    operation: "DeleteParameter",
                    name: name.to_string(),
                })
            }
            Err(e) => {
                metrics::record_remote_operation("ssm_delete_parameter", "error", elapsed);
                Err(ProviderError::Service {
                    operation: "DeleteParameter",
                    message: DisplayErrorContext(&e).to_string(),
                })
            }
        }
    }
}
