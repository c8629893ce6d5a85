use alloy::{eips::BlockNumberOrTag, providers::Provider};
use tokio::time::{Instant, sleep};

use super::{EvmRegistrar, provider::BlockchainProvider};
use crate::{config::BlockchainContext, error::BlockchainError};

impl EvmRegistrar {
    /// Polls the `finalized` block tag until it reaches `block`.
    pub(crate) async fn wait_for_finalized_block(
        &self,
        context: &BlockchainContext,
        provider: &BlockchainProvider,
        block: u64,
    ) -> Result<(), BlockchainError> {
        let timeout = context.block_finalization_timeout();
        let deadline = Instant::now() + timeout;

        loop {
            let finalized = self
                .rpc_call(context, "get_finalized_block", || async {
                    provider
                        .get_block_by_number(BlockNumberOrTag::Finalized)
                        .await
                })
                .await;

            match finalized {
                Ok(Some(finalized)) if finalized.header.number >= block => {
                    tracing::debug!(
                        blockchain = %context.name,
                        block,
                        finalized = finalized.header.number,
                        "Block finalized"
                    );
                    return Ok(());
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(
                    blockchain = %context.name,
                    error = %e,
                    "Failed to fetch finalized block"
                ),
            }

            if Instant::now() >= deadline {
                return Err(BlockchainError::FinalizationTimeout {
                    block,
                    timeout_secs: timeout.as_secs(),
                });
            }
            sleep(context.block_finalization_poll_interval()).await;
        }
    }
}
