use std::time::Duration;

use async_trait::async_trait;
use dkg_domain::{OperationKind, OperationResult};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::{
    FinalityResponse, NodeApi, NodeInfo, OperationIdResponse, OperationRequest,
    OperationResultResponse,
};
use crate::{config::NodeConfig, error::DkgError};

/// [`NodeApi`] over HTTP with optional bearer authentication.
pub struct HttpNodeApi {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpNodeApi {
    pub fn new(config: &NodeConfig) -> Result<Self, DkgError> {
        let client = Client::builder()
            .pool_max_idle_per_host(10)
            .connect_timeout(Duration::from_secs(10))
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            auth_token: config.auth_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth_headers(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, DkgError> {
        let response = self.auth_headers(builder).send().await?;
        Ok(ensure_success(response).await?.json::<T>().await?)
    }
}

async fn ensure_success(response: Response) -> Result<Response, DkgError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(DkgError::Transport(format!(
        "{url} responded with {status}: {body}"
    )))
}

#[async_trait]
impl NodeApi for HttpNodeApi {
    async fn info(&self) -> Result<NodeInfo, DkgError> {
        self.send(self.client.get(self.url("info"))).await
    }

    async fn submit(&self, request: &OperationRequest) -> Result<Uuid, DkgError> {
        let builder = self.client.post(self.url(request.kind().path()));
        let builder = match request {
            OperationRequest::Publish(body) => builder.json(body),
            OperationRequest::Get(body) => builder.json(body),
            OperationRequest::LocalStore(body) => builder.json(body),
            OperationRequest::Query(body) => builder.json(body),
            OperationRequest::Finality(body) => builder.json(body),
        };

        let response: OperationIdResponse = self.send(builder).await?;
        tracing::debug!(
            operation = request.kind().as_str(),
            operation_id = %response.operation_id,
            "Operation submitted"
        );
        Ok(response.operation_id)
    }

    async fn operation_result(
        &self,
        kind: OperationKind,
        operation_id: Uuid,
    ) -> Result<OperationResult, DkgError> {
        let url = self.url(&format!("{}/{}", kind.path(), operation_id));
        let response: OperationResultResponse = self.send(self.client.get(url)).await?;
        Ok(OperationResult::new(
            operation_id,
            response.status,
            response.data,
        ))
    }

    async fn finality(&self, ual: &str) -> Result<u64, DkgError> {
        let builder = self.client.get(self.url("finality")).query(&[("ual", ual)]);
        let response: FinalityResponse = self.send(builder).await?;
        Ok(response.finality)
    }
}
