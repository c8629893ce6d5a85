use std::{sync::Arc, time::Instant};

use alloy::primitives::{B256, U256};
use dkg_blockchain::{BlockchainContext, Registrar};
use dkg_domain::{
    CreatedKnowledgeCollection, FinalityOutcome, FinalityStatus, KnowledgeCollectionRequest,
    OperationKind, OperationResult, OperationStatus, derive_ual,
};
use dkg_observability::{record_dataset_size, record_publish_stage};
use serde::Serialize;
use validator::Validate;

use super::assertions::{AssertionContent, prepare_dataset};
use crate::{
    config::options::ResolvedPublishOptions,
    error::DkgError,
    services::{
        FinalityService, OperationService,
        node_api::{OperationRequest, PublishRequest},
    },
};

/// Bytes per kilobyte used when pricing storage.
const ASK_UNIT_BYTES: u64 = 1024;

/// Outcome of a `create` call.
///
/// `ual` is `None` when the node did not accept the publish; `publish` then
/// holds the status and error reported by the node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResult {
    pub ual: Option<String>,
    pub dataset_root: B256,
    pub publish: OperationResult,
    #[serde(skip)]
    pub knowledge_collection: Option<CreatedKnowledgeCollection>,
    pub finality: Option<FinalityOutcome>,
}

pub(crate) struct PublishInput<'a> {
    pub content: &'a AssertionContent,
    pub options: ResolvedPublishOptions,
    pub blockchain: &'a BlockchainContext,
}

/// Storage cost for `byte_size` bytes over `epochs` at the given ask.
pub(crate) fn estimate_token_amount(ask: U256, epochs: u64, byte_size: usize) -> U256 {
    ask.saturating_mul(U256::from(epochs))
        .saturating_mul(U256::from(byte_size))
        / U256::from(ASK_UNIT_BYTES)
}

/// Rejects a context whose identifier would produce an unparseable UAL.
pub(crate) fn ensure_valid_blockchain(blockchain: &BlockchainContext) -> Result<(), DkgError> {
    blockchain
        .validate()
        .map_err(|e| DkgError::Validation(format!("Invalid blockchain context: {e}")))
}

fn record_stage<T>(stage: &str, started: Instant, result: &Result<T, DkgError>) {
    let status = if result.is_ok() { "success" } else { "error" };
    record_publish_stage(stage, status, started.elapsed());
}

pub(crate) struct PublishWorkflow {
    operations: Arc<OperationService>,
    finality: Arc<FinalityService>,
    registrar: Arc<dyn Registrar>,
}

impl PublishWorkflow {
    pub(crate) fn new(
        operations: Arc<OperationService>,
        finality: Arc<FinalityService>,
        registrar: Arc<dyn Registrar>,
    ) -> Self {
        Self {
            operations,
            finality,
            registrar,
        }
    }

    pub(crate) async fn execute(&self, input: &PublishInput<'_>) -> Result<PublishResult, DkgError> {
        let options = &input.options;
        let blockchain = input.blockchain;
        ensure_valid_blockchain(blockchain)?;

        let started = Instant::now();
        let prepared = prepare_dataset(input.content, options.max_dataset_byte_size);
        record_stage("prepare", started, &prepared);
        let prepared = prepared?;
        record_dataset_size(prepared.byte_size, prepared.chunk_count);

        let dataset_root = prepared.dataset_root;
        tracing::info!(
            dataset_root = %dataset_root,
            byte_size = prepared.byte_size,
            knowledge_assets = prepared.knowledge_assets_amount,
            blockchain = %blockchain.name,
            "Publishing dataset"
        );

        let request = OperationRequest::Publish(PublishRequest {
            dataset_root,
            dataset: prepared.assertion.clone(),
            blockchain: blockchain.name.clone(),
            hash_function_id: options.hash_function_id,
            minimum_number_of_node_replications: options.minimum_number_of_node_replications,
        });

        let started = Instant::now();
        let publish = self.operations.execute(&request, options.poll).await;
        record_stage("publish", started, &publish);
        let publish = publish?;

        if publish.status != OperationStatus::Completed && !publish.min_acks_reached() {
            tracing::warn!(
                operation_id = %publish.operation_id,
                status = %publish.status,
                error_type = publish.error_type().unwrap_or_default(),
                error_message = publish.error_message().unwrap_or_default(),
                "Publish was not accepted by the node"
            );
            return Ok(PublishResult {
                ual: None,
                dataset_root,
                publish,
                knowledge_collection: None,
                finality: None,
            });
        }

        let data = publish
            .publish_data()
            .map_err(|e| DkgError::Format(format!("Invalid publish result: {e}")))?;
        let publisher_node_signature =
            data.publisher_node_signature
                .ok_or_else(|| DkgError::OperationFailed {
                    operation: OperationKind::Publish.to_string(),
                    error_type: "MISSING_PUBLISHER_SIGNATURE".to_string(),
                    message: "Publish result carries no publisher node signature".to_string(),
                })?;

        let token_amount = match options.token_amount {
            Some(amount) => amount,
            None => {
                let ask = self.registrar.stake_weighted_average_ask(blockchain).await?;
                estimate_token_amount(ask, options.epochs_num, prepared.assertion_size)
            }
        };

        let request = KnowledgeCollectionRequest {
            publish_operation_id: publish.operation_id.to_string(),
            merkle_root: dataset_root,
            knowledge_assets_amount: prepared.knowledge_assets_amount as u64,
            byte_size: prepared.assertion_size as u64,
            epochs: options.epochs_num,
            token_amount,
            is_immutable: options.immutable,
            paymaster: options.paymaster,
            publisher_node_signature,
            signatures: data.signatures,
        };

        let started = Instant::now();
        let created = self
            .registrar
            .create_knowledge_collection(&request, blockchain)
            .await
            .map_err(DkgError::from);
        record_stage("mint", started, &created);
        let created = created?;

        let ual = derive_ual(
            &blockchain.name,
            &created.storage_contract,
            created.knowledge_collection_id,
        );
        tracing::info!(
            ual = %ual,
            transaction_hash = %created.transaction_hash,
            "Knowledge collection created"
        );

        let finality = match options.minimum_number_of_finalization_confirmations {
            0 => None,
            required => {
                let started = Instant::now();
                let outcome = self
                    .finality
                    .await_finality(
                        &ual,
                        blockchain.name.as_str(),
                        u64::from(required),
                        options.poll,
                    )
                    .await;
                let status = match outcome.status {
                    FinalityStatus::Finalized => "success",
                    FinalityStatus::NotFinalized => "error",
                };
                record_publish_stage("finality", status, started.elapsed());
                Some(outcome)
            }
        };

        Ok(PublishResult {
            ual: Some(ual),
            dataset_root,
            publish,
            knowledge_collection: Some(created),
            finality,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_amount_scales_with_size_and_epochs() {
        let ask = U256::from(2048u64);
        assert_eq!(estimate_token_amount(ask, 2, 512), U256::from(2048u64));
        assert_eq!(estimate_token_amount(ask, 1, 0), U256::ZERO);
        assert_eq!(estimate_token_amount(U256::MAX, 2, 2048), U256::MAX / U256::from(1024u64));
    }
}
