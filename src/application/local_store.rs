use std::sync::Arc;

use dkg_blockchain::BlockchainContext;
use dkg_domain::OperationResult;

use super::{
    assertions::{AssertionContent, prepare_dataset},
    publish::ensure_valid_blockchain,
};
use crate::{
    config::options::ResolvedLocalStoreOptions,
    error::DkgError,
    services::{
        OperationService,
        node_api::{LocalStoreRequest, OperationRequest},
    },
};

/// Stores a dataset on the connected node only, without minting.
pub(crate) struct LocalStoreWorkflow {
    operations: Arc<OperationService>,
}

impl LocalStoreWorkflow {
    pub(crate) fn new(operations: Arc<OperationService>) -> Self {
        Self { operations }
    }

    pub(crate) async fn execute(
        &self,
        content: &AssertionContent,
        options: &ResolvedLocalStoreOptions,
        blockchain: &BlockchainContext,
    ) -> Result<OperationResult, DkgError> {
        ensure_valid_blockchain(blockchain)?;
        let prepared = prepare_dataset(content, options.max_dataset_byte_size)?;
        tracing::debug!(
            dataset_root = %prepared.dataset_root,
            byte_size = prepared.byte_size,
            "Storing dataset on local node"
        );

        let request = OperationRequest::LocalStore(LocalStoreRequest {
            dataset_root: prepared.dataset_root,
            dataset: prepared.assertion,
            blockchain: blockchain.name.clone(),
        });
        self.operations.execute(&request, options.poll).await
    }
}
