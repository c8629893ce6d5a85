//! Boundary to a DKG node's HTTP API.

mod dto;
mod http;

use async_trait::async_trait;
use dkg_domain::{OperationKind, OperationResult};
pub use dto::{
    AskRequest, FinalityResponse, GetRequest, LocalStoreRequest, NodeInfo, OperationIdResponse,
    OperationResultResponse, PublishRequest, QueryRequest,
};
pub use http::HttpNodeApi;
use uuid::Uuid;

use crate::error::DkgError;

/// A request that starts an asynchronous operation on the node.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationRequest {
    Publish(PublishRequest),
    Get(GetRequest),
    LocalStore(LocalStoreRequest),
    Query(QueryRequest),
    Finality(AskRequest),
}

impl OperationRequest {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Publish(_) => OperationKind::Publish,
            Self::Get(_) => OperationKind::Get,
            Self::LocalStore(_) => OperationKind::LocalStore,
            Self::Query(_) => OperationKind::Query,
            Self::Finality(_) => OperationKind::Finality,
        }
    }
}

#[async_trait]
pub trait NodeApi: Send + Sync {
    /// `GET /info`
    async fn info(&self) -> Result<NodeInfo, DkgError>;

    /// `POST /{kind}`; returns the node's operation id.
    async fn submit(&self, request: &OperationRequest) -> Result<Uuid, DkgError>;

    /// `GET /{kind}/{operation_id}`
    async fn operation_result(
        &self,
        kind: OperationKind,
        operation_id: Uuid,
    ) -> Result<OperationResult, DkgError>;

    /// `GET /finality?ual=`; number of nodes that confirmed the collection.
    async fn finality(&self, ual: &str) -> Result<u64, DkgError>;
}

#[cfg(test)]
mod tests;
