//! # PushEncryptedSecret Status
//!
//! Status types recording the outcome of the last publish or delete attempt.

use serde::{Deserialize, Deserializer, Serialize};

/// Reason prefix used when a store operation failed
pub const STORE_FAILED: &str = "Failed to store";

/// Reason used when every entry was published
pub const STORE_SUCCESS: &str = "Successfully synced to Parameter store";

/// Status of the PushEncryptedSecret resource
///
/// Every write replaces all five fields at once.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PushEncryptedSecretStatus {
    /// Outcome of the last attempt: "", SUCCESS or ERROR
    #[serde(default)]
    pub status: SyncPhase,
    /// Human-readable failure reason, empty on success
    #[serde(default)]
    pub reason: String,
    /// Fingerprint of the entry list last acted upon
    #[serde(default)]
    pub hash: String,
    /// Operation that failed: "", CREATE, UPDATE or DELETE
    #[serde(default)]
    pub error_on_operation: FailedOperation,
    /// Time of the last status write (RFC3339)
    #[serde(default)]
    pub last_update: Option<String>,
}

impl PushEncryptedSecretStatus {
    /// Status after a failed operation
    #[must_use]
    pub fn error(reason: impl Into<String>, hash: impl Into<String>, operation: FailedOperation) -> Self {
        Self {
            status: SyncPhase::Error,
            reason: reason.into(),
            hash: hash.into(),
            error_on_operation: operation,
            last_update: Some(chrono::Utc::now().to_rfc3339()),
        }
    }

    /// Status after a successful publish or cleanup
    #[must_use]
    pub fn success(hash: impl Into<String>) -> Self {
        Self {
            status: SyncPhase::Success,
            reason: String::new(),
            hash: hash.into(),
            error_on_operation: FailedOperation::None,
            last_update: Some(chrono::Utc::now().to_rfc3339()),
        }
    }
}

/// Recorded outcome phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncPhase {
    #[default]
    #[serde(rename = "")]
    Unset,
    Success,
    Error,
}

impl SyncPhase {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncPhase::Unset => "",
            SyncPhase::Success => "SUCCESS",
            SyncPhase::Error => "ERROR",
        }
    }

    fn from_wire(value: &str) -> Self {
        match value {
            "SUCCESS" => SyncPhase::Success,
            "ERROR" => SyncPhase::Error,
            _ => SyncPhase::Unset,
        }
    }
}

// Unknown values written by other clients read back as unset.
impl<'de> Deserialize<'de> for SyncPhase {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map_or(SyncPhase::Unset, SyncPhase::from_wire))
    }
}

/// Operation tag recorded alongside an ERROR status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailedOperation {
    #[default]
    #[serde(rename = "")]
    None,
    Create,
    Update,
    Delete,
}

impl FailedOperation {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FailedOperation::None => "",
            FailedOperation::Create => "CREATE",
            FailedOperation::Update => "UPDATE",
            FailedOperation::Delete => "DELETE",
        }
    }

    fn from_wire(value: &str) -> Self {
        match value {
            "CREATE" => FailedOperation::Create,
            "UPDATE" => FailedOperation::Update,
            "DELETE" => FailedOperation::Delete,
            _ => FailedOperation::None,
        }
    }
}

impl<'de> Deserialize<'de> for FailedOperation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map_or(FailedOperation::None, FailedOperation::from_wire))
    }
}

impl std::fmt::Display for FailedOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
