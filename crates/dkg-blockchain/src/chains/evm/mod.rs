use std::{collections::HashMap, time::Instant};

use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use dashmap::DashMap;
use dkg_domain::{BlockchainId, CreatedKnowledgeCollection, KnowledgeCollectionRequest};
use dkg_observability::record_blockchain_rpc_call;

use crate::{
    config::BlockchainContext,
    error::BlockchainError,
    registrar::Registrar,
    rpc_executor::{RetryPolicy, RetryableError, retry},
};

mod contracts;
mod finality;
mod knowledge_collection;
mod provider;
mod transaction;
mod wallets;

pub use contracts::ContractName;
use contracts::{AskStorage, Hub, KnowledgeCollectionStorage};
pub use knowledge_collection::{allowance_gap, checked_uint};
use provider::BlockchainProvider;

type ContractKey = (BlockchainId, Address);

/// [`Registrar`] over EVM JSON-RPC.
///
/// Holds no per-chain configuration. The only state is the Hub lookup cache,
/// keyed by `(blockchain, hub contract)`.
pub struct EvmRegistrar {
    contracts: DashMap<ContractKey, HashMap<ContractName, Address>>,
    rpc_retry_policy: RetryPolicy,
    tx_retry_policy: RetryPolicy,
}

impl Default for EvmRegistrar {
    fn default() -> Self {
        Self::new()
    }
}

impl EvmRegistrar {
    pub fn new() -> Self {
        Self {
            contracts: DashMap::new(),
            rpc_retry_policy: RetryPolicy::reads(),
            tx_retry_policy: RetryPolicy::transactions(),
        }
    }

    /// Forgets resolved addresses, e.g. after a Hub upgrade.
    pub fn clear_contract_cache(&self) {
        self.contracts.clear();
    }

    /// Read call with retry on transient RPC failures.
    pub(crate) async fn rpc_call<T, E, F, O>(
        &self,
        context: &BlockchainContext,
        operation: &'static str,
        f: F,
    ) -> Result<T, E>
    where
        E: RetryableError,
        F: FnMut() -> O,
        O: std::future::IntoFuture<Output = Result<T, E>>,
    {
        let started = Instant::now();
        let result = retry(self.rpc_retry_policy, operation, f).await;
        let status = if result.is_ok() { "ok" } else { "error" };
        record_blockchain_rpc_call(
            context.name.as_str(),
            operation,
            status,
            started.elapsed(),
        );
        result
    }

    pub(crate) async fn contract_address(
        &self,
        context: &BlockchainContext,
        provider: &BlockchainProvider,
        name: ContractName,
    ) -> Result<Address, BlockchainError> {
        if name == ContractName::Hub {
            return Ok(context.hub_contract);
        }

        let key = (context.name.clone(), context.hub_contract);
        if let Some(address) = self
            .contracts
            .get(&key)
            .and_then(|resolved| resolved.get(&name).copied())
        {
            return Ok(address);
        }

        let resolved = self.resolve_contracts(context, provider).await?;
        let address =
            resolved
                .get(&name)
                .copied()
                .ok_or_else(|| BlockchainError::ContractNotFound {
                    contract: name.to_string(),
                    hub: context.hub_contract,
                })?;
        self.contracts.insert(key, resolved);
        Ok(address)
    }

    async fn resolve_contracts(
        &self,
        context: &BlockchainContext,
        provider: &BlockchainProvider,
    ) -> Result<HashMap<ContractName, Address>, BlockchainError> {
        let hub = Hub::new(context.hub_contract, provider.clone());
        let mut resolved = HashMap::with_capacity(ContractName::RESOLVED.len());

        for name in ContractName::RESOLVED {
            let address = if name.is_asset_storage() {
                self.rpc_call(context, "hub_get_asset_storage_address", || async {
                    hub.getAssetStorageAddress(name.as_str().to_string())
                        .call()
                        .await
                })
                .await?
            } else {
                self.rpc_call(context, "hub_get_contract_address", || async {
                    hub.getContractAddress(name.as_str().to_string())
                        .call()
                        .await
                })
                .await?
            };

            if address == Address::ZERO {
                return Err(BlockchainError::ContractNotFound {
                    contract: name.to_string(),
                    hub: context.hub_contract,
                });
            }
            resolved.insert(name, address);
        }

        tracing::debug!(
            blockchain = %context.name,
            hub = %context.hub_contract,
            contracts = ?resolved,
            "Resolved contracts through Hub"
        );
        Ok(resolved)
    }
}

#[async_trait]
impl Registrar for EvmRegistrar {
    async fn storage_contract_address(
        &self,
        context: &BlockchainContext,
    ) -> Result<Address, BlockchainError> {
        let provider = provider::connect(context).await?;
        self.contract_address(context, &provider, ContractName::KnowledgeCollectionStorage)
            .await
    }

    async fn stake_weighted_average_ask(
        &self,
        context: &BlockchainContext,
    ) -> Result<U256, BlockchainError> {
        let provider = provider::connect(context).await?;
        let address = self
            .contract_address(context, &provider, ContractName::AskStorage)
            .await?;
        let ask_storage = AskStorage::new(address, provider.clone());
        let ask = self
            .rpc_call(context, "get_stake_weighted_average_ask", || async {
                ask_storage.getStakeWeightedAverageAsk().call().await
            })
            .await?;
        Ok(ask)
    }

    async fn create_knowledge_collection(
        &self,
        request: &KnowledgeCollectionRequest,
        context: &BlockchainContext,
    ) -> Result<CreatedKnowledgeCollection, BlockchainError> {
        self.mint_knowledge_collection(request, context).await
    }

    async fn latest_merkle_root(
        &self,
        knowledge_collection_id: u128,
        context: &BlockchainContext,
    ) -> Result<B256, BlockchainError> {
        let provider = provider::connect(context).await?;
        let address = self
            .contract_address(context, &provider, ContractName::KnowledgeCollectionStorage)
            .await?;
        let storage = KnowledgeCollectionStorage::new(address, provider.clone());
        let root = self
            .rpc_call(context, "get_latest_merkle_root", || async {
                storage
                    .getLatestMerkleRoot(U256::from(knowledge_collection_id))
                    .call()
                    .await
            })
            .await?;
        Ok(root)
    }
}
