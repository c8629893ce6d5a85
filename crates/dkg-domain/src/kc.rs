use alloy::primitives::{Address, B256, U256};

use crate::NodeSignature;

/// Everything the ledger needs to register a knowledge collection.
#[derive(Debug, Clone)]
pub struct KnowledgeCollectionRequest {
    pub publish_operation_id: String,
    pub merkle_root: B256,
    pub knowledge_assets_amount: u64,
    pub byte_size: u64,
    pub epochs: u64,
    pub token_amount: U256,
    pub is_immutable: bool,
    pub paymaster: Address,
    pub publisher_node_signature: NodeSignature,
    pub signatures: Vec<NodeSignature>,
}

/// Outcome of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedKnowledgeCollection {
    pub knowledge_collection_id: u128,
    pub storage_contract: Address,
    pub transaction_hash: B256,
    pub block_number: Option<u64>,
}
