//! Submits operations to the node and drives the bounded result poll.

use std::{sync::Arc, time::Instant};

use dkg_domain::{OperationKind, OperationResult, OperationStatus, PollPolicy};
use dkg_observability::{
    record_operation_duration, record_operation_poll, record_operation_retries_exhausted,
};
use serde_json::json;
use tokio::time::sleep;
use uuid::Uuid;

use super::node_api::{NodeApi, OperationRequest};
use crate::error::DkgError;

pub(crate) struct OperationService {
    node_api: Arc<dyn NodeApi>,
}

impl OperationService {
    pub(crate) fn new(node_api: Arc<dyn NodeApi>) -> Self {
        Self { node_api }
    }

    pub(crate) async fn submit(&self, request: &OperationRequest) -> Result<Uuid, DkgError> {
        let operation_id = self.node_api.submit(request).await?;
        tracing::debug!(
            operation = %request.kind(),
            operation_id = %operation_id,
            "Operation submitted"
        );
        Ok(operation_id)
    }

    /// Polls until the operation settles or the retry budget is spent.
    ///
    /// Fetch failures are recorded as `NETWORK ERROR` and polled again. With
    /// `max_retries = n` at most `n + 1` fetches are made; exhaustion yields a
    /// FAILED result carrying `DKG_CLIENT_ERROR`.
    pub(crate) async fn await_result(
        &self,
        kind: OperationKind,
        operation_id: Uuid,
        policy: PollPolicy,
    ) -> OperationResult {
        let started = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            sleep(policy.frequency).await;
            attempt += 1;

            let result = match self.node_api.operation_result(kind, operation_id).await {
                Ok(result) => result,
                Err(error) => {
                    tracing::warn!(
                        operation = %kind,
                        operation_id = %operation_id,
                        attempt,
                        error = %error,
                        "Failed to fetch operation result"
                    );
                    OperationResult::new(
                        operation_id,
                        OperationStatus::NetworkError,
                        json!({ "errorMessage": error.to_string() }),
                    )
                }
            };

            record_operation_poll(kind.as_str(), result.status.as_str());

            if result.is_settled() {
                tracing::debug!(
                    operation = %kind,
                    operation_id = %operation_id,
                    status = %result.status,
                    attempt,
                    "Operation settled"
                );
                record_operation_duration(kind.as_str(), result.status.as_str(), started.elapsed());
                return result;
            }

            if attempt > policy.max_retries {
                tracing::warn!(
                    operation = %kind,
                    operation_id = %operation_id,
                    last_status = %result.status,
                    "Max number of retries reached"
                );
                record_operation_retries_exhausted(kind.as_str());
                return OperationResult::retries_exhausted(operation_id);
            }
        }
    }

    /// Submits and then waits for the result.
    pub(crate) async fn execute(
        &self,
        request: &OperationRequest,
        policy: PollPolicy,
    ) -> Result<OperationResult, DkgError> {
        let operation_id = self.submit(request).await?;
        Ok(self
            .await_result(request.kind(), operation_id, policy)
            .await)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::time::Duration;

    use dkg_domain::{DKG_CLIENT_ERROR, MAX_RETRIES_REACHED_MESSAGE};

    use super::*;
    use crate::services::{
        mock::MockNodeApi,
        node_api::{OperationRequest, QueryRequest},
    };

    fn service(mock: &Arc<MockNodeApi>) -> OperationService {
        OperationService::new(Arc::clone(mock) as Arc<dyn NodeApi>)
    }

    fn policy(max_retries: u32) -> PollPolicy {
        PollPolicy::new(Duration::from_secs(5), max_retries)
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_operation_is_fetched_at_most_n_plus_one_times() {
        let mock = Arc::new(MockNodeApi::default());
        let started = tokio::time::Instant::now();

        let result = service(&mock)
            .await_result(OperationKind::Publish, Uuid::new_v4(), policy(3))
            .await;

        assert_eq!(mock.fetch_count(OperationKind::Publish), 4);
        assert_eq!(result.status, OperationStatus::Failed);
        assert_eq!(result.error_type(), Some(DKG_CLIENT_ERROR));
        assert_eq!(result.error_message(), Some(MAX_RETRIES_REACHED_MESSAGE));
        assert_eq!(started.elapsed(), Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_fetches_once() {
        let mock = Arc::new(MockNodeApi::default());
        service(&mock)
            .await_result(OperationKind::Get, Uuid::new_v4(), policy(0))
            .await;
        assert_eq!(mock.fetch_count(OperationKind::Get), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_on_first_response_returns_immediately() {
        let mock = Arc::new(MockNodeApi::default());
        mock.push_result(
            OperationKind::Publish,
            OperationStatus::Failed,
            json!({"errorType": "PUBLISH_ERROR", "errorMessage": "Not enough replications"}),
        );

        let result = service(&mock)
            .await_result(OperationKind::Publish, Uuid::new_v4(), policy(10))
            .await;

        assert_eq!(mock.fetch_count(OperationKind::Publish), 1);
        assert_eq!(result.status, OperationStatus::Failed);
        assert_eq!(result.error_message(), Some("Not enough replications"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_min_acks_reached_exits_before_completion() {
        let mock = Arc::new(MockNodeApi::default());
        mock.push_result(OperationKind::Publish, OperationStatus::Pending, json!({}));
        mock.push_result(
            OperationKind::Publish,
            OperationStatus::Pending,
            json!({"minAcksReached": true}),
        );

        let result = service(&mock)
            .await_result(OperationKind::Publish, Uuid::new_v4(), policy(10))
            .await;

        assert_eq!(mock.fetch_count(OperationKind::Publish), 2);
        assert_eq!(result.status, OperationStatus::Pending);
        assert!(result.min_acks_reached());
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_errors_are_retried() {
        let mock = Arc::new(MockNodeApi::default());
        mock.push_fetch_error(OperationKind::Query, "connection refused");
        mock.push_fetch_error(OperationKind::Query, "connection refused");
        mock.push_result(
            OperationKind::Query,
            OperationStatus::Completed,
            json!({"data": []}),
        );

        let result = service(&mock)
            .await_result(OperationKind::Query, Uuid::new_v4(), policy(5))
            .await;

        assert_eq!(mock.fetch_count(OperationKind::Query), 3);
        assert_eq!(result.status, OperationStatus::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_errors_alone_exhaust_retries() {
        let mock = Arc::new(MockNodeApi::default());
        mock.push_fetch_error(OperationKind::Get, "timeout");

        let result = service(&mock)
            .await_result(OperationKind::Get, Uuid::new_v4(), policy(2))
            .await;

        assert_eq!(mock.fetch_count(OperationKind::Get), 3);
        assert_eq!(result.error_type(), Some(DKG_CLIENT_ERROR));
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_submits_once() {
        let mock = Arc::new(MockNodeApi::default());
        mock.push_result(OperationKind::Query, OperationStatus::Completed, json!([]));
        let request = OperationRequest::Query(QueryRequest {
            query: "SELECT * WHERE { ?s ?p ?o }".to_string(),
            query_type: "SELECT".to_string(),
            repository: None,
            paranet_ual: None,
        });

        let result = service(&mock).execute(&request, policy(5)).await.unwrap();

        assert_eq!(result.status, OperationStatus::Completed);
        assert_eq!(mock.submitted_kinds(), vec![OperationKind::Query]);
        let fetched = mock.fetches.lock().unwrap()[0].1;
        assert_eq!(fetched, result.operation_id);
    }
}
