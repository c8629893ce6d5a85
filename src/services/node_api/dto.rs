use alloy::primitives::B256;
use dkg_domain::{Assertion, BlockchainId, ContentType, OperationStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub dataset_root: B256,
    pub dataset: Assertion,
    pub blockchain: BlockchainId,
    pub hash_function_id: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_number_of_node_replications: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GetRequest {
    /// UAL of the knowledge collection or asset.
    pub id: String,
    pub content_type: ContentType,
    pub include_metadata: bool,
    pub hash_function_id: u8,
    #[serde(rename = "paranetUAL", skip_serializing_if = "Option::is_none")]
    pub paranet_ual: Option<String>,
    #[serde(rename = "subjectUAL")]
    pub subject_ual: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocalStoreRequest {
    pub dataset_root: B256,
    pub dataset: Assertion,
    pub blockchain: BlockchainId,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub query: String,
    #[serde(rename = "type")]
    pub query_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(rename = "paranetUAL", skip_serializing_if = "Option::is_none")]
    pub paranet_ual: Option<String>,
}

/// Body of `POST /ask`, which starts a publish-finality operation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    pub ual: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_number_of_node_replications: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OperationIdResponse {
    pub operation_id: Uuid,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OperationResultResponse {
    pub status: OperationStatus,
    #[serde(default)]
    pub data: Value,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FinalityResponse {
    #[serde(default)]
    pub finality: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    pub version: String,
}
