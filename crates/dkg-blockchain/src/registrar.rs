use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use dkg_domain::{CreatedKnowledgeCollection, KnowledgeCollectionRequest};

use crate::{config::BlockchainContext, error::BlockchainError};

/// On-chain side of publishing. Every call receives the caller's context; an
/// implementation may cache contract addresses but never mutates the context.
#[async_trait]
pub trait Registrar: Send + Sync {
    /// Address of the KnowledgeCollectionStorage contract, used in UALs.
    async fn storage_contract_address(
        &self,
        context: &BlockchainContext,
    ) -> Result<Address, BlockchainError>;

    /// Current stake-weighted average ask, in token wei per kilobyte-epoch.
    async fn stake_weighted_average_ask(
        &self,
        context: &BlockchainContext,
    ) -> Result<U256, BlockchainError>;

    /// Mints a knowledge collection, raising the token allowance first if needed.
    async fn create_knowledge_collection(
        &self,
        request: &KnowledgeCollectionRequest,
        context: &BlockchainContext,
    ) -> Result<CreatedKnowledgeCollection, BlockchainError>;

    async fn latest_merkle_root(
        &self,
        knowledge_collection_id: u128,
        context: &BlockchainContext,
    ) -> Result<B256, BlockchainError>;
}
