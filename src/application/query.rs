use std::sync::Arc;

use dkg_domain::OperationResult;

use crate::{
    config::options::ResolvedQueryOptions,
    error::DkgError,
    services::{
        OperationService,
        node_api::{OperationRequest, QueryRequest},
    },
};

pub(crate) struct QueryWorkflow {
    operations: Arc<OperationService>,
}

impl QueryWorkflow {
    pub(crate) fn new(operations: Arc<OperationService>) -> Self {
        Self { operations }
    }

    pub(crate) async fn execute(
        &self,
        query: &str,
        options: &ResolvedQueryOptions,
    ) -> Result<OperationResult, DkgError> {
        if query.trim().is_empty() {
            return Err(DkgError::Validation("Query must not be empty".to_string()));
        }

        let request = OperationRequest::Query(QueryRequest {
            query: query.to_string(),
            query_type: options.query_type.clone(),
            repository: options.repository.clone(),
            paranet_ual: options.paranet_ual.clone(),
        });
        self.operations.execute(&request, options.poll).await
    }
}
