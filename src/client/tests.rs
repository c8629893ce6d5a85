#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, B256, U256, address};
use async_trait::async_trait;
use dkg_blockchain::{BlockchainContext, BlockchainError, Registrar};
use dkg_domain::{
    Assertion, BlockchainId, CHUNK_BYTE_SIZE, CreatedKnowledgeCollection, DKG_CLIENT_ERROR,
    FinalityStatus, KnowledgeCollectionRequest, OperationKind, OperationStatus,
    calculate_merkle_root, constants::PRIVATE_RESOURCE_PREDICATE, parse_ual,
};
use serde_json::{Value, json};

use super::DkgClient;
use crate::{
    application::{
        ROOT_MISMATCH_MESSAGE,
        assertions::{AssertionContent, Content},
    },
    config::{
        defaults::client_config,
        options::{GetOptions, LocalStoreOptions, PublishOptions, QueryOptions},
    },
    error::DkgError,
    services::{
        mock::MockNodeApi,
        node_api::{NodeApi, OperationRequest},
    },
};

const STORAGE: Address = address!("8f678eb0e57ee8a109b295710e23076fa3a443fe");

#[derive(Default)]
struct MockRegistrar {
    requests: Mutex<Vec<KnowledgeCollectionRequest>>,
    next_id: u128,
    ask: U256,
    on_chain_root: Mutex<B256>,
    fail_mint: bool,
}

#[async_trait]
impl Registrar for MockRegistrar {
    async fn storage_contract_address(
        &self,
        _context: &BlockchainContext,
    ) -> Result<Address, BlockchainError> {
        Ok(STORAGE)
    }

    async fn stake_weighted_average_ask(
        &self,
        _context: &BlockchainContext,
    ) -> Result<U256, BlockchainError> {
        Ok(self.ask)
    }

    async fn create_knowledge_collection(
        &self,
        request: &KnowledgeCollectionRequest,
        _context: &BlockchainContext,
    ) -> Result<CreatedKnowledgeCollection, BlockchainError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail_mint {
            return Err(BlockchainError::TransactionFailed {
                contract: "KnowledgeCollection".to_string(),
                function: "createKnowledgeCollection".to_string(),
                reason: "execution reverted".to_string(),
            });
        }
        Ok(CreatedKnowledgeCollection {
            knowledge_collection_id: self.next_id,
            storage_contract: STORAGE,
            transaction_hash: B256::repeat_byte(0xaa),
            block_number: Some(10),
        })
    }

    async fn latest_merkle_root(
        &self,
        _knowledge_collection_id: u128,
        _context: &BlockchainContext,
    ) -> Result<B256, BlockchainError> {
        Ok(*self.on_chain_root.lock().unwrap())
    }
}

fn signature(identity_id: u64) -> Value {
    json!({
        "identityId": identity_id.to_string(),
        "r": format!("0x{}", "11".repeat(32)),
        "vs": format!("0x{}", "22".repeat(32)),
    })
}

fn accepted_publish() -> Value {
    json!({
        "minAcksReached": true,
        "publisherNodeSignature": signature(1),
        "signatures": [signature(2), signature(3)],
    })
}

fn client(node: &Arc<MockNodeApi>, registrar: &Arc<MockRegistrar>) -> DkgClient {
    let mut config = client_config();
    config.defaults.frequency_ms = 10;
    config.defaults.max_number_of_retries = 3;
    config.defaults.minimum_number_of_finalization_confirmations = 0;
    DkgClient::with_components(
        config,
        Arc::clone(node) as Arc<dyn NodeApi>,
        Arc::clone(registrar) as Arc<dyn Registrar>,
    )
}

fn statements(lines: &[&str]) -> Content {
    Content::Statements(lines.iter().map(|line| line.to_string()).collect())
}

fn submitted_dataset(node: &MockNodeApi) -> Assertion {
    match &node.submitted.lock().unwrap()[0] {
        OperationRequest::Publish(request) => request.dataset.clone(),
        OperationRequest::LocalStore(request) => request.dataset.clone(),
        other => panic!("unexpected request {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_create_groups_commits_and_returns_ual_for_minted_id() {
    let node = Arc::new(MockNodeApi::default());
    node.push_result(OperationKind::Publish, OperationStatus::Completed, accepted_publish());
    let registrar = Arc::new(MockRegistrar {
        next_id: 42,
        ask: U256::from(1024u64),
        ..Default::default()
    });

    let content = AssertionContent::from(statements(&["<a> <b> <d> .", "<a> <b> <c> ."]));
    let result = client(&node, &registrar)
        .create(&content, &PublishOptions::default())
        .await
        .unwrap();

    let public = vec!["<a> <b> <c> .".to_string(), "<a> <b> <d> .".to_string()];
    assert_eq!(submitted_dataset(&node), Assertion::new(public.clone(), None));
    assert_eq!(result.dataset_root, calculate_merkle_root(&public));

    let ual = parse_ual(result.ual.as_deref().unwrap()).unwrap();
    assert_eq!(ual.knowledge_collection_id, 42);
    assert_eq!(ual.contract, STORAGE);
    assert_eq!(ual.blockchain.as_str(), "hardhat1:31337");
    assert!(result.finality.is_none());

    let requests = registrar.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.merkle_root, result.dataset_root);
    assert_eq!(request.knowledge_assets_amount, 1);
    // 27 bytes of statements occupy one 32-byte chunk on the ledger
    assert_eq!(request.byte_size, 32);
    assert_eq!(request.byte_size % CHUNK_BYTE_SIZE as u64, 0);
    assert_eq!(request.epochs, 2);
    // ask 1024 per KB-epoch, 2 epochs, 32 bytes
    assert_eq!(request.token_amount, U256::from(64u64));
    assert_eq!(request.publisher_node_signature.identity_id, 1);
    assert_eq!(request.signatures.len(), 2);
    assert_eq!(
        request.publish_operation_id,
        result.publish.operation_id.to_string()
    );
}

#[tokio::test(start_paused = true)]
async fn test_create_places_shared_subject_reference_in_its_group() {
    let node = Arc::new(MockNodeApi::default());
    node.push_result(OperationKind::Publish, OperationStatus::Completed, accepted_publish());
    let registrar = Arc::new(MockRegistrar::default());

    let content = AssertionContent::new(
        statements(&["<x> <name> \"visible\" .", "<y> <name> \"other\" ."]),
        Some(statements(&["<x> <secret> \"hidden\" ."])),
    );
    client(&node, &registrar)
        .create(&content, &PublishOptions::default())
        .await
        .unwrap();

    let dataset = submitted_dataset(&node);
    let x_group: Vec<&String> = dataset
        .public
        .iter()
        .skip_while(|statement| !statement.starts_with("<x> "))
        .take_while(|statement| statement.starts_with("<x> "))
        .collect();
    assert_eq!(x_group.len(), 2);
    assert!(
        x_group
            .iter()
            .any(|statement| statement.contains(PRIVATE_RESOURCE_PREDICATE))
    );
    assert!(!dataset.public.iter().any(|s| s.contains("hidden")));
    assert_eq!(
        dataset.private,
        Some(vec!["<x> <secret> \"hidden\" .".to_string()])
    );
}

#[tokio::test(start_paused = true)]
async fn test_rejected_publish_returns_without_minting() {
    let node = Arc::new(MockNodeApi::default());
    node.push_result(
        OperationKind::Publish,
        OperationStatus::Failed,
        json!({"errorType": "PUBLISH_ERROR", "errorMessage": "Not enough nodes"}),
    );
    let registrar = Arc::new(MockRegistrar::default());

    let content = AssertionContent::from(statements(&["<a> <b> <c> ."]));
    let result = client(&node, &registrar)
        .create(&content, &PublishOptions::default())
        .await
        .unwrap();

    assert!(result.ual.is_none());
    assert_eq!(result.publish.status, OperationStatus::Failed);
    assert_eq!(result.publish.error_message(), Some("Not enough nodes"));
    assert_eq!(node.fetch_count(OperationKind::Publish), 1);
    assert!(registrar.requests.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_publish_reports_client_error() {
    let node = Arc::new(MockNodeApi::default());
    let registrar = Arc::new(MockRegistrar::default());

    let content = AssertionContent::from(statements(&["<a> <b> <c> ."]));
    let result = client(&node, &registrar)
        .create(&content, &PublishOptions::default())
        .await
        .unwrap();

    assert!(result.ual.is_none());
    assert_eq!(result.publish.error_type(), Some(DKG_CLIENT_ERROR));
    assert_eq!(node.fetch_count(OperationKind::Publish), 4);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_input_fails_before_any_request() {
    let node = Arc::new(MockNodeApi::default());
    let registrar = Arc::new(MockRegistrar::default());
    let client = client(&node, &registrar);

    let oversized = PublishOptions {
        max_dataset_byte_size: Some(4),
        ..Default::default()
    };
    let content = AssertionContent::from(statements(&["<a> <b> <c> ."]));
    assert!(matches!(
        client.create(&content, &oversized).await,
        Err(DkgError::SizeLimit(_))
    ));

    let malformed = AssertionContent::from(Content::NQuads("not a quad".to_string()));
    assert!(matches!(
        client.create(&malformed, &PublishOptions::default()).await,
        Err(DkgError::Format(_))
    ));

    assert!(matches!(
        client.get("did:dkg:otp/0x00/1", &GetOptions::default()).await,
        Err(DkgError::Validation(_))
    ));

    assert!(node.submitted.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_blockchain_without_chain_id_is_rejected_before_minting() {
    let node = Arc::new(MockNodeApi::default());
    node.push_result(OperationKind::Publish, OperationStatus::Completed, accepted_publish());
    let registrar = Arc::new(MockRegistrar::default());

    let mut config = client_config();
    config.blockchain.name = BlockchainId::from("otp");
    let client = DkgClient::with_components(
        config,
        Arc::clone(&node) as Arc<dyn NodeApi>,
        Arc::clone(&registrar) as Arc<dyn Registrar>,
    );

    let content = AssertionContent::from(statements(&["<a> <b> <c> ."]));
    assert!(matches!(
        client.create(&content, &PublishOptions::default()).await,
        Err(DkgError::Validation(_))
    ));
    assert!(matches!(
        client.local_store(&content, &LocalStoreOptions::default()).await,
        Err(DkgError::Validation(_))
    ));

    assert!(node.submitted.lock().unwrap().is_empty());
    assert!(registrar.requests.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_ledger_errors_propagate() {
    let node = Arc::new(MockNodeApi::default());
    node.push_result(OperationKind::Publish, OperationStatus::Completed, accepted_publish());
    let registrar = Arc::new(MockRegistrar {
        fail_mint: true,
        ..Default::default()
    });

    let content = AssertionContent::from(statements(&["<a> <b> <c> ."]));
    let options = PublishOptions {
        token_amount: Some(U256::from(5u64)),
        ..Default::default()
    };
    let result = client(&node, &registrar).create(&content, &options).await;

    assert!(matches!(
        result,
        Err(DkgError::Ledger(BlockchainError::TransactionFailed { .. }))
    ));
    assert_eq!(
        registrar.requests.lock().unwrap()[0].token_amount,
        U256::from(5u64)
    );
}

#[tokio::test(start_paused = true)]
async fn test_create_tracks_finality_when_confirmations_required() {
    let node = Arc::new(MockNodeApi::default());
    node.push_result(OperationKind::Publish, OperationStatus::Completed, accepted_publish());
    node.push_finality(Ok(0));
    node.push_finality(Ok(2));
    let registrar = Arc::new(MockRegistrar {
        next_id: 7,
        ..Default::default()
    });

    let options = PublishOptions {
        minimum_number_of_finalization_confirmations: Some(2),
        ..Default::default()
    };
    let content = AssertionContent::from(statements(&["<a> <b> <c> ."]));
    let result = client(&node, &registrar)
        .create(&content, &options)
        .await
        .unwrap();

    let finality = result.finality.unwrap();
    assert_eq!(finality.status, FinalityStatus::Finalized);
    assert_eq!(finality.confirmations, 2);
    assert_eq!(*node.finality_calls.lock().unwrap(), 2);
}

fn collection_ual() -> String {
    format!(
        "did:dkg:hardhat1:31337/{}/42",
        alloy::hex::encode_prefixed(STORAGE)
    )
}

#[tokio::test(start_paused = true)]
async fn test_get_validates_against_on_chain_root() {
    let public = vec!["<a> <b> <c> .".to_string()];
    let node = Arc::new(MockNodeApi::default());
    node.push_result(
        OperationKind::Get,
        OperationStatus::Completed,
        json!({"assertion": {"public": public}, "metadata": null}),
    );
    let registrar = Arc::new(MockRegistrar::default());
    *registrar.on_chain_root.lock().unwrap() = calculate_merkle_root(&public);

    let result = client(&node, &registrar)
        .get(&collection_ual(), &GetOptions::default())
        .await
        .unwrap();

    assert_eq!(result.operation.status, OperationStatus::Completed);
    assert_eq!(result.assertion, Some(Assertion::new(public, None)));
    assert_eq!(result.metadata, None);
}

#[tokio::test(start_paused = true)]
async fn test_get_root_mismatch_is_reported_as_failed() {
    let node = Arc::new(MockNodeApi::default());
    node.push_result(
        OperationKind::Get,
        OperationStatus::Completed,
        json!({"assertion": ["<a> <b> <c> ."]}),
    );
    let registrar = Arc::new(MockRegistrar::default());

    let result = client(&node, &registrar)
        .get(&collection_ual(), &GetOptions::default())
        .await
        .unwrap();

    assert_eq!(result.operation.status, OperationStatus::Failed);
    assert_eq!(
        result.operation.error_message(),
        Some(ROOT_MISMATCH_MESSAGE)
    );
    assert!(result.assertion.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_get_skips_validation_when_disabled() {
    let node = Arc::new(MockNodeApi::default());
    node.push_result(
        OperationKind::Get,
        OperationStatus::Completed,
        json!({"assertion": {"public": ["<a> <b> <c> ."], "private": ["<a> <s> \"p\" ."]}}),
    );
    let registrar = Arc::new(MockRegistrar::default());

    let options = GetOptions {
        validate: Some(false),
        ..Default::default()
    };
    let result = client(&node, &registrar)
        .get(&collection_ual(), &options)
        .await
        .unwrap();

    let assertion = result.assertion.unwrap();
    assert_eq!(assertion.private_statements().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_query_and_update() {
    let node = Arc::new(MockNodeApi::default());
    node.push_result(
        OperationKind::Query,
        OperationStatus::Completed,
        json!({"data": [{"s": "a"}]}),
    );
    let registrar = Arc::new(MockRegistrar::default());
    let client = client(&node, &registrar);

    let result = client
        .query("SELECT ?s WHERE { ?s ?p ?o }", &QueryOptions::default())
        .await
        .unwrap();
    assert_eq!(result.status, OperationStatus::Completed);
    assert!(matches!(
        client.query("  ", &QueryOptions::default()).await,
        Err(DkgError::Validation(_))
    ));

    let content = AssertionContent::from(statements(&["<a> <b> <c> ."]));
    assert!(matches!(
        client
            .update(&collection_ual(), &content, &PublishOptions::default())
            .await,
        Err(DkgError::Unsupported("update"))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_local_store_and_publish_finality() {
    let node = Arc::new(MockNodeApi::default());
    node.push_result(OperationKind::LocalStore, OperationStatus::Completed, json!({}));
    node.push_result(OperationKind::Finality, OperationStatus::Completed, json!({}));
    let registrar = Arc::new(MockRegistrar::default());
    let client = client(&node, &registrar);

    let content = AssertionContent::from(statements(&["<a> <b> <c> ."]));
    let stored = client
        .local_store(&content, &Default::default())
        .await
        .unwrap();
    assert_eq!(stored.status, OperationStatus::Completed);
    assert_eq!(
        submitted_dataset(&node).public,
        vec!["<a> <b> <c> .".to_string()]
    );

    let finality = client
        .publish_finality(&collection_ual(), &Default::default())
        .await
        .unwrap();
    assert_eq!(finality.status, OperationStatus::Completed);
    assert_eq!(
        node.submitted_kinds(),
        vec![OperationKind::LocalStore, OperationKind::Finality]
    );
    assert_eq!(client.node_info().await.unwrap().version, "8.0.0-mock");
}
