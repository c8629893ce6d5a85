use std::sync::Arc;

use dkg_domain::{OperationResult, parse_ual};

use crate::{
    config::options::ResolvedFinalityOptions,
    error::DkgError,
    services::{
        OperationService,
        node_api::{AskRequest, OperationRequest},
    },
};

/// Asks the node to confirm that enough replicas of a collection exist.
pub(crate) struct PublishFinalityWorkflow {
    operations: Arc<OperationService>,
}

impl PublishFinalityWorkflow {
    pub(crate) fn new(operations: Arc<OperationService>) -> Self {
        Self { operations }
    }

    pub(crate) async fn execute(
        &self,
        ual: &str,
        options: &ResolvedFinalityOptions,
    ) -> Result<OperationResult, DkgError> {
        parse_ual(ual)?;

        let request = OperationRequest::Finality(AskRequest {
            ual: ual.to_string(),
            minimum_number_of_node_replications: options.minimum_number_of_node_replications,
        });
        self.operations.execute(&request, options.poll).await
    }
}
