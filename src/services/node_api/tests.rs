#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use alloy::primitives::B256;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use dkg_domain::{Assertion, BlockchainId, OperationKind, OperationStatus};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use uuid::Uuid;

use super::*;
use crate::config::{NodeConfig, defaults};

const TOKEN: &str = "test-token";

#[derive(Clone, Default)]
struct Recorded {
    bodies: Arc<Mutex<Vec<Value>>>,
    auth: Arc<Mutex<Vec<Option<String>>>>,
}

fn authorization(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

async fn spawn_node() -> (String, u16, Recorded) {
    let recorded = Recorded::default();
    let operation_id = Uuid::nil();

    let app = Router::new()
        .route(
            "/info",
            get(|State(recorded): State<Recorded>, headers: HeaderMap| async move {
                recorded.auth.lock().unwrap().push(authorization(&headers));
                Json(json!({ "version": "8.1.0" }))
            }),
        )
        .route(
            "/publish",
            post(
                move |State(recorded): State<Recorded>, Json(body): Json<Value>| async move {
                    recorded.bodies.lock().unwrap().push(body);
                    Json(json!({ "operationId": operation_id }))
                },
            ),
        )
        .route(
            "/publish/:operation_id",
            get(|Path(_id): Path<Uuid>| async {
                Json(json!({ "status": "COMPLETED", "data": { "minAcksReached": true } }))
            }),
        )
        .route(
            "/local-store/:operation_id",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        )
        .route(
            "/finality",
            get(|Query(params): Query<std::collections::HashMap<String, String>>| async move {
                let confirmations = if params.get("ual").is_some_and(|ual| ual.starts_with("did:dkg:")) {
                    3
                } else {
                    0
                };
                Json(json!({ "finality": confirmations }))
            }),
        )
        .with_state(recorded.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    ("http://127.0.0.1".to_string(), port, recorded)
}

fn node_config(endpoint: String, port: u16) -> NodeConfig {
    NodeConfig {
        endpoint,
        port,
        auth_token: Some(TOKEN.to_string()),
        ..defaults::node()
    }
}

#[tokio::test]
async fn test_info_sends_bearer_token() {
    let (endpoint, port, recorded) = spawn_node().await;
    let api = HttpNodeApi::new(&node_config(endpoint, port)).unwrap();

    let info = api.info().await.unwrap();
    assert_eq!(info.version, "8.1.0");
    assert_eq!(
        recorded.auth.lock().unwrap().as_slice(),
        &[Some(format!("Bearer {TOKEN}"))]
    );
}

#[tokio::test]
async fn test_submit_publish_uses_camel_case_body() {
    let (endpoint, port, recorded) = spawn_node().await;
    let api = HttpNodeApi::new(&node_config(endpoint, port)).unwrap();

    let request = OperationRequest::Publish(PublishRequest {
        dataset_root: B256::repeat_byte(0x01),
        dataset: Assertion::new(vec!["<a> <b> <c> .".to_string()], None),
        blockchain: BlockchainId::from("hardhat1:31337"),
        hash_function_id: 1,
        minimum_number_of_node_replications: Some(3),
    });

    let operation_id = api.submit(&request).await.unwrap();
    assert_eq!(operation_id, Uuid::nil());

    let bodies = recorded.bodies.lock().unwrap();
    let body = &bodies[0];
    assert_eq!(body["datasetRoot"], json!(format!("0x{}", "01".repeat(32))));
    assert_eq!(body["dataset"]["public"][0], "<a> <b> <c> .");
    assert_eq!(body["blockchain"], "hardhat1:31337");
    assert_eq!(body["hashFunctionId"], 1);
    assert_eq!(body["minimumNumberOfNodeReplications"], 3);
}

#[tokio::test]
async fn test_operation_result_and_errors() {
    let (endpoint, port, _) = spawn_node().await;
    let api = HttpNodeApi::new(&node_config(endpoint, port)).unwrap();
    let id = Uuid::new_v4();

    let result = api
        .operation_result(OperationKind::Publish, id)
        .await
        .unwrap();
    assert_eq!(result.operation_id, id);
    assert_eq!(result.status, OperationStatus::Completed);
    assert!(result.min_acks_reached());

    let err = api
        .operation_result(OperationKind::LocalStore, id)
        .await
        .unwrap_err();
    assert!(matches!(err, DkgError::Transport(message) if message.contains("500")));
}

#[tokio::test]
async fn test_finality_passes_ual_query() {
    let (endpoint, port, _) = spawn_node().await;
    let api = HttpNodeApi::new(&node_config(endpoint, port)).unwrap();

    let ual = "did:dkg:hardhat1:31337/0x0000000000000000000000000000000000000001/1";
    assert_eq!(api.finality(ual).await.unwrap(), 3);
    assert_eq!(api.finality("garbage").await.unwrap(), 0);
}

#[test]
fn test_request_kinds() {
    let ask = OperationRequest::Finality(AskRequest {
        ual: "did:dkg:x".to_string(),
        minimum_number_of_node_replications: None,
    });
    assert_eq!(ask.kind(), OperationKind::Finality);
    assert_eq!(ask.kind().path(), "ask");

    let query = QueryRequest {
        query: "SELECT * WHERE { ?s ?p ?o }".to_string(),
        query_type: "SELECT".to_string(),
        repository: None,
        paranet_ual: Some("did:dkg:p".to_string()),
    };
    let body = serde_json::to_value(&query).unwrap();
    assert_eq!(body["type"], "SELECT");
    assert_eq!(body["paranetUAL"], "did:dkg:p");
    assert!(body.get("repository").is_none());
}
