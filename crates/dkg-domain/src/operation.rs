use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::NodeSignature;

/// Error type reported when polling gives up.
pub const DKG_CLIENT_ERROR: &str = "DKG_CLIENT_ERROR";
pub const MAX_RETRIES_REACHED_MESSAGE: &str =
    "Unable to get results. Max number of retries reached.";

/// Remote operations a node exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
    Publish,
    Get,
    LocalStore,
    Query,
    /// Replica-count confirmation of a published collection.
    Finality,
}

impl OperationKind {
    /// Path segment used to submit the operation and fetch its result.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::Get => "get",
            Self::LocalStore => "local-store",
            Self::Query => "query",
            Self::Finality => "ask",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::Get => "get",
            Self::LocalStore => "local_store",
            Self::Query => "query",
            Self::Finality => "finality",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status string reported by a node, plus the synthetic network error status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OperationStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    /// The result could not be fetched; never reported by a node.
    NetworkError,
    Other(String),
}

impl OperationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::NetworkError => "NETWORK ERROR",
            Self::Other(status) => status,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl From<String> for OperationStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "PENDING" => Self::Pending,
            "IN_PROGRESS" => Self::InProgress,
            "COMPLETED" => Self::Completed,
            "FAILED" => Self::Failed,
            "NETWORK ERROR" => Self::NetworkError,
            _ => Self::Other(value),
        }
    }
}

impl From<OperationStatus> for String {
    fn from(value: OperationStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latest known state of a remote operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult {
    pub operation_id: Uuid,
    pub status: OperationStatus,
    #[serde(default)]
    pub data: Value,
}

impl OperationResult {
    pub fn new(operation_id: Uuid, status: OperationStatus, data: Value) -> Self {
        Self {
            operation_id,
            status,
            data,
        }
    }

    /// Result reported when polling runs out of retries.
    pub fn retries_exhausted(operation_id: Uuid) -> Self {
        Self::new(
            operation_id,
            OperationStatus::Failed,
            serde_json::json!({
                "errorType": DKG_CLIENT_ERROR,
                "errorMessage": MAX_RETRIES_REACHED_MESSAGE,
            }),
        )
    }

    pub fn min_acks_reached(&self) -> bool {
        self.data
            .get("minAcksReached")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn error_type(&self) -> Option<&str> {
        self.data.get("errorType").and_then(Value::as_str)
    }

    pub fn error_message(&self) -> Option<&str> {
        self.data.get("errorMessage").and_then(Value::as_str)
    }

    /// True once the node either finished or gathered enough acknowledgements.
    pub fn is_settled(&self) -> bool {
        self.status.is_terminal() || self.min_acks_reached()
    }

    pub fn publish_data(&self) -> Result<PublishOperationData, serde_json::Error> {
        serde_json::from_value(self.data.clone())
    }
}

/// `data` of a publish operation result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishOperationData {
    #[serde(default)]
    pub min_acks_reached: bool,
    #[serde(default)]
    pub publisher_node_signature: Option<NodeSignature>,
    #[serde(default)]
    pub signatures: Vec<NodeSignature>,
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// How often and how many times to fetch an operation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub frequency: Duration,
    /// `n` retries allow at most `n + 1` fetches.
    pub max_retries: u32,
}

impl PollPolicy {
    pub fn new(frequency: Duration, max_retries: u32) -> Self {
        Self {
            frequency,
            max_retries,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalityStatus {
    #[serde(rename = "FINALIZED")]
    Finalized,
    #[serde(rename = "NOT FINALIZED")]
    NotFinalized,
}

impl fmt::Display for FinalityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finalized => f.write_str("FINALIZED"),
            Self::NotFinalized => f.write_str("NOT FINALIZED"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalityOutcome {
    pub status: FinalityStatus,
    pub confirmations: u64,
}

/// Which part of a knowledge collection a get returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Public,
    Private,
    #[default]
    All,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => f.write_str("public"),
            Self::Private => f.write_str("private"),
            Self::All => f.write_str("all"),
        }
    }
}
