use std::sync::Arc;

use dkg_blockchain::{BlockchainContext, Registrar};
use dkg_domain::{
    Assertion, ContentType, DKG_CLIENT_ERROR, OperationResult, OperationStatus, Ual,
    calculate_merkle_root, parse_ual,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    config::options::ResolvedGetOptions,
    error::DkgError,
    services::{
        OperationService,
        node_api::{GetRequest, OperationRequest},
    },
};

pub(crate) const ROOT_MISMATCH_MESSAGE: &str = "Calculated root hashes don't match!";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetResult {
    pub assertion: Option<Assertion>,
    pub metadata: Option<Value>,
    pub operation: OperationResult,
}

/// Nodes return either a partitioned dataset or, for a single content
/// type, a bare statement list.
#[derive(Deserialize)]
#[serde(untagged)]
enum FetchedAssertion {
    Partitioned(Assertion),
    Statements(Vec<String>),
}

impl From<FetchedAssertion> for Assertion {
    fn from(fetched: FetchedAssertion) -> Self {
        match fetched {
            FetchedAssertion::Partitioned(assertion) => assertion,
            FetchedAssertion::Statements(public) => Assertion::new(public, None),
        }
    }
}

pub(crate) struct GetInput<'a> {
    pub ual: &'a str,
    pub options: ResolvedGetOptions,
    pub blockchain: &'a BlockchainContext,
}

pub(crate) struct GetWorkflow {
    operations: Arc<OperationService>,
    registrar: Arc<dyn Registrar>,
}

impl GetWorkflow {
    pub(crate) fn new(operations: Arc<OperationService>, registrar: Arc<dyn Registrar>) -> Self {
        Self {
            operations,
            registrar,
        }
    }

    pub(crate) async fn execute(&self, input: &GetInput<'_>) -> Result<GetResult, DkgError> {
        let options = &input.options;
        let ual = parse_ual(input.ual)?;
        let validate_root = options.validate && commits_public_root(&ual, options);
        if validate_root && ual.blockchain != input.blockchain.name {
            return Err(DkgError::Validation(format!(
                "UAL blockchain {} does not match the configured blockchain {}",
                ual.blockchain, input.blockchain.name
            )));
        }

        let request = OperationRequest::Get(GetRequest {
            id: input.ual.to_string(),
            content_type: options.content_type,
            include_metadata: options.include_metadata,
            hash_function_id: options.hash_function_id,
            paranet_ual: options.paranet_ual.clone(),
            subject_ual: options.subject_ual,
        });
        let operation = self.operations.execute(&request, options.poll).await?;

        if operation.status != OperationStatus::Completed {
            tracing::warn!(
                ual = %input.ual,
                status = %operation.status,
                error_message = operation.error_message().unwrap_or_default(),
                "Get did not complete"
            );
            return Ok(GetResult {
                assertion: None,
                metadata: None,
                operation,
            });
        }

        let assertion: Option<Assertion> = match operation.data.get("assertion") {
            Some(value) if !value.is_null() => Some(
                serde_json::from_value::<FetchedAssertion>(value.clone())
                    .map_err(|e| DkgError::Format(format!("Invalid get result: {e}")))?
                    .into(),
            ),
            _ => None,
        };
        let metadata = operation
            .data
            .get("metadata")
            .filter(|value| !value.is_null())
            .cloned();

        if let Some(fetched) = assertion.as_ref().filter(|_| validate_root) {
            let on_chain = self
                .registrar
                .latest_merkle_root(ual.knowledge_collection_id, input.blockchain)
                .await?;
            let computed = calculate_merkle_root(&fetched.public);

            if on_chain != computed {
                tracing::warn!(
                    ual = %input.ual,
                    on_chain = %on_chain,
                    computed = %computed,
                    "Fetched dataset does not match the on-chain Merkle root"
                );
                return Ok(GetResult {
                    assertion: None,
                    metadata: None,
                    operation: OperationResult::new(
                        operation.operation_id,
                        OperationStatus::Failed,
                        json!({
                            "errorType": DKG_CLIENT_ERROR,
                            "errorMessage": ROOT_MISMATCH_MESSAGE,
                        }),
                    ),
                });
            }
        }

        Ok(GetResult {
            assertion,
            metadata,
            operation,
        })
    }
}

/// Only a whole collection's public part can be checked against the on-chain
/// root.
fn commits_public_root(ual: &Ual, options: &ResolvedGetOptions) -> bool {
    ual.knowledge_asset_id.is_none()
        && !options.subject_ual
        && options.content_type != ContentType::Private
}
