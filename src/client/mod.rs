//! Public entry point tying the node API, the ledger registrar and the
//! configured defaults together.

use std::sync::Arc;

use dkg_blockchain::{BlockchainContext, EvmRegistrar, Registrar};
use dkg_domain::{FinalityOutcome, OperationResult, parse_ual};

use crate::{
    application::{
        GetInput, GetResult, GetWorkflow, LocalStoreWorkflow, PublishFinalityWorkflow,
        PublishInput, PublishResult, PublishWorkflow, QueryWorkflow,
        assertions::AssertionContent,
    },
    config::{
        ClientConfig,
        options::{
            FinalityOptions, GetOptions, LocalStoreOptions, PublishOptions, QueryOptions,
            resolve_finality, resolve_get, resolve_local_store, resolve_publish, resolve_query,
        },
    },
    error::DkgError,
    services::{
        FinalityService, OperationService,
        node_api::{HttpNodeApi, NodeApi, NodeInfo},
    },
};

pub struct DkgClient {
    config: ClientConfig,
    node_api: Arc<dyn NodeApi>,
    finality: Arc<FinalityService>,
    publish: PublishWorkflow,
    get: GetWorkflow,
    query: QueryWorkflow,
    local_store: LocalStoreWorkflow,
    publish_finality: PublishFinalityWorkflow,
}

impl DkgClient {
    /// Client talking to the configured node over HTTP and to an EVM ledger.
    pub fn new(config: ClientConfig) -> Result<Self, DkgError> {
        let node_api = Arc::new(HttpNodeApi::new(&config.node)?);
        Ok(Self::with_components(
            config,
            node_api,
            Arc::new(EvmRegistrar::new()),
        ))
    }

    pub fn with_components(
        config: ClientConfig,
        node_api: Arc<dyn NodeApi>,
        registrar: Arc<dyn Registrar>,
    ) -> Self {
        let operations = Arc::new(OperationService::new(Arc::clone(&node_api)));
        let finality = Arc::new(FinalityService::new(Arc::clone(&node_api)));

        Self {
            publish: PublishWorkflow::new(
                Arc::clone(&operations),
                Arc::clone(&finality),
                Arc::clone(&registrar),
            ),
            get: GetWorkflow::new(Arc::clone(&operations), registrar),
            query: QueryWorkflow::new(Arc::clone(&operations)),
            local_store: LocalStoreWorkflow::new(Arc::clone(&operations)),
            publish_finality: PublishFinalityWorkflow::new(operations),
            finality,
            node_api,
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn blockchain(&self) -> &BlockchainContext {
        &self.config.blockchain
    }

    /// Version handshake with the node.
    pub async fn node_info(&self) -> Result<NodeInfo, DkgError> {
        self.node_api.info().await
    }

    /// Publishes `content` as a new knowledge collection.
    ///
    /// Runs canonicalization, partitioning and commitment locally, then the
    /// node publish, the on-chain mint and, when confirmations are required,
    /// finality tracking. Returns early without a UAL when the node does not
    /// accept the publish.
    pub async fn create(
        &self,
        content: &AssertionContent,
        options: &PublishOptions,
    ) -> Result<PublishResult, DkgError> {
        let input = PublishInput {
            content,
            options: resolve_publish(options, &self.config.defaults)?,
            blockchain: &self.config.blockchain,
        };
        self.publish.execute(&input).await
    }

    pub async fn get(&self, ual: &str, options: &GetOptions) -> Result<GetResult, DkgError> {
        let input = GetInput {
            ual,
            options: resolve_get(options, &self.config.defaults)?,
            blockchain: &self.config.blockchain,
        };
        self.get.execute(&input).await
    }

    /// Runs a SPARQL query on the node.
    pub async fn query(
        &self,
        query: &str,
        options: &QueryOptions,
    ) -> Result<OperationResult, DkgError> {
        let options = resolve_query(options, &self.config.defaults)?;
        self.query.execute(query, &options).await
    }

    pub async fn local_store(
        &self,
        content: &AssertionContent,
        options: &LocalStoreOptions,
    ) -> Result<OperationResult, DkgError> {
        let options = resolve_local_store(options, &self.config.defaults)?;
        self.local_store
            .execute(content, &options, &self.config.blockchain)
            .await
    }

    /// Starts a node-side replication check for `ual` (`POST /ask`).
    pub async fn publish_finality(
        &self,
        ual: &str,
        options: &FinalityOptions,
    ) -> Result<OperationResult, DkgError> {
        let options = resolve_finality(options, &self.config.defaults)?;
        self.publish_finality.execute(ual, &options).await
    }

    /// Current confirmation count for `ual`.
    pub async fn finality_status(&self, ual: &str) -> Result<u64, DkgError> {
        parse_ual(ual)?;
        self.finality.finality_status(ual).await
    }

    pub async fn await_finality(
        &self,
        ual: &str,
        options: &FinalityOptions,
    ) -> Result<FinalityOutcome, DkgError> {
        let parsed = parse_ual(ual)?;
        let options = resolve_finality(options, &self.config.defaults)?;
        Ok(self
            .finality
            .await_finality(
                ual,
                parsed.blockchain.as_str(),
                u64::from(options.minimum_number_of_finalization_confirmations),
                options.poll,
            )
            .await)
    }

    /// Updating a published collection is not supported by this client.
    pub async fn update(
        &self,
        _ual: &str,
        _content: &AssertionContent,
        _options: &PublishOptions,
    ) -> Result<PublishResult, DkgError> {
        Err(DkgError::Unsupported("update"))
    }
}

#[cfg(test)]
mod tests;
