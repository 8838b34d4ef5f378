//! # PushEncryptedSecret Spec
//!
//! Main CRD specification types.

use serde::{Deserialize, Serialize};

/// PushEncryptedSecret Custom Resource Definition
///
/// Declares a list of KMS-encrypted values to be decrypted by the controller
/// and stored in AWS Systems Manager Parameter Store as `SecureString`
/// parameters.
///
/// # Example
///
/// ```yaml
/// apiVersion: encryptor.dev/v1beta1
/// kind: PushEncryptedSecret
/// metadata:
///   name: payments-api
///   namespace: payments
/// spec:
///   data:
///     - encryptedSecret: AQICAHh...base64...
///       remoteRefKey: /payments/prod/db_password
/// ```
#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "PushEncryptedSecret",
    group = "encryptor.dev",
    version = "v1beta1",
    namespaced,
    status = "crate::crd::PushEncryptedSecretStatus",
    shortname = "pes",
    printcolumn = r#"{"name":"STATUS", "type":"string", "jsonPath":".status.status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PushEncryptedSecretSpec {
    /// Ordered entries to publish. Order is significant for change detection.
    pub data: Vec<EncryptedEntry>,
}

/// A single encrypted value and the parameter name it is published under
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedEntry {
    /// Base64-encoded KMS ciphertext blob
    pub encrypted_secret: String,
    /// Parameter Store name the decrypted value is written to
    pub remote_ref_key: String,
}

impl EncryptedEntry {
    pub fn new(encrypted_secret: impl Into<String>, remote_ref_key: impl Into<String>) -> Self {
        Self {
            encrypted_secret: encrypted_secret.into(),
            remote_ref_key: remote_ref_key.into(),
        }
    }
}
