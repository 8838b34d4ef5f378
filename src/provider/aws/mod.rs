//! # AWS Providers
//!
//! KMS and Systems Manager Parameter Store clients.
//!
//! Both clients are built once from a shared `SdkConfig` loaded through the
//! default credential chain, which covers IRSA (IAM Roles for Service
//! Accounts) on EKS. Endpoint overrides allow pointing either client at a
//! local stack.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use tracing::info;

pub mod kms;
pub mod parameter_store;

pub use kms::AwsKms;
pub use parameter_store::AwsParameterStore;

/// Load the shared AWS SDK configuration
///
/// Uses `region` when given, otherwise the SDK default region chain.
pub async fn load_sdk_config(region: Option<&str>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        info!("Using AWS region: {}", region);
        loader = loader.region(Region::new(region.to_string()));
    } else {
        info!("No AWS_REGION configured, using SDK default region chain");
    }
    loader.load().await
}
