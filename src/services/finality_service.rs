//! Confirmation counting for published knowledge collections.

use std::sync::Arc;

use dkg_domain::{FinalityOutcome, FinalityStatus, PollPolicy};
use dkg_observability::record_finality_result;
use tokio::time::sleep;

use super::node_api::NodeApi;
use crate::error::DkgError;

pub(crate) struct FinalityService {
    node_api: Arc<dyn NodeApi>,
}

impl FinalityService {
    pub(crate) fn new(node_api: Arc<dyn NodeApi>) -> Self {
        Self { node_api }
    }

    /// Number of nodes that currently confirm `ual`.
    pub(crate) async fn finality_status(&self, ual: &str) -> Result<u64, DkgError> {
        self.node_api.finality(ual).await
    }

    /// Polls until `required` confirmations are reported or the budget is spent.
    ///
    /// A failed poll counts as zero confirmations.
    pub(crate) async fn await_finality(
        &self,
        ual: &str,
        blockchain: &str,
        required: u64,
        policy: PollPolicy,
    ) -> FinalityOutcome {
        let mut confirmations = 0;

        for attempt in 0..=policy.max_retries {
            sleep(policy.frequency).await;

            confirmations = match self.finality_status(ual).await {
                Ok(count) => count,
                Err(error) => {
                    tracing::warn!(ual, attempt, error = %error, "Finality poll failed");
                    0
                }
            };

            if confirmations >= required {
                tracing::debug!(ual, confirmations, required, "Knowledge collection finalized");
                record_finality_result(blockchain, "finalized", confirmations);
                return FinalityOutcome {
                    status: FinalityStatus::Finalized,
                    confirmations,
                };
            }
        }

        tracing::warn!(
            ual,
            confirmations,
            required,
            "Knowledge collection not finalized within retry budget"
        );
        record_finality_result(blockchain, "not_finalized", confirmations);
        FinalityOutcome {
            status: FinalityStatus::NotFinalized,
            confirmations,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::time::Duration;

    use super::*;
    use crate::services::mock::MockNodeApi;

    const UAL: &str = "did:dkg:hardhat1:31337/0x8f678eb0e57ee8a109b295710e23076fa3a443fe/1";

    fn service(mock: &Arc<MockNodeApi>) -> FinalityService {
        FinalityService::new(Arc::clone(mock) as Arc<dyn NodeApi>)
    }

    fn policy(max_retries: u32) -> PollPolicy {
        PollPolicy::new(Duration::from_secs(1), max_retries)
    }

    #[tokio::test(start_paused = true)]
    async fn test_finalizes_once_required_confirmations_reported() {
        let mock = Arc::new(MockNodeApi::default());
        mock.push_finality(Ok(1));
        mock.push_finality(Ok(3));

        let outcome = service(&mock)
            .await_finality(UAL, "hardhat1:31337", 3, policy(5))
            .await;

        assert_eq!(
            outcome,
            FinalityOutcome {
                status: FinalityStatus::Finalized,
                confirmations: 3
            }
        );
        assert_eq!(*mock.finality_calls.lock().unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_count_as_zero_and_budget_is_bounded() {
        let mock = Arc::new(MockNodeApi::default());
        mock.push_finality(Ok(2));
        mock.push_finality(Err("node unreachable"));

        let outcome = service(&mock)
            .await_finality(UAL, "hardhat1:31337", 3, policy(2))
            .await;

        assert_eq!(outcome.status, FinalityStatus::NotFinalized);
        assert_eq!(outcome.confirmations, 0);
        assert_eq!(*mock.finality_calls.lock().unwrap(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_passes_through_count() {
        let mock = Arc::new(MockNodeApi::default());
        mock.push_finality(Ok(7));
        assert_eq!(service(&mock).finality_status(UAL).await.unwrap(), 7);
    }
}
