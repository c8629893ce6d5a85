use std::time::Instant;

use alloy::{
    contract::{CallBuilder, CallDecoder, Error as ContractError},
    network::Ethereum,
    primitives::{Address, B256},
    providers::Provider,
    rpc::types::TransactionReceipt,
};
use dkg_observability::{
    record_blockchain_gas_price, record_blockchain_tx_retry, record_blockchain_tx_stage,
};

use super::{EvmRegistrar, contracts::ContractName, provider::BlockchainProvider};
use crate::{
    config::BlockchainContext,
    error::BlockchainError,
    error_classification::{
        classify_receipt_error, classify_tx_error, contract_error_backoff_hint,
        is_retryable_contract_error, revert_reason,
    },
    gas::{TxAttemptState, TxRetryReason, apply_gas_estimate_multiplier, resolve_gas_price},
};

impl EvmRegistrar {
    /// Sends a state-changing call and waits for its receipt.
    ///
    /// All attempts share one nonce, so a retry replaces whatever the previous
    /// attempt left in the mempool. The nonce is refetched only after
    /// `nonce too low`, once it is clear none of our own attempts was mined.
    pub(crate) async fn send_transaction<'a, D, F>(
        &self,
        context: &BlockchainContext,
        provider: &BlockchainProvider,
        contract: ContractName,
        function: &'static str,
        mut build_call: F,
    ) -> Result<TransactionReceipt, BlockchainError>
    where
        D: CallDecoder,
        F: FnMut() -> CallBuilder<&'a BlockchainProvider, D, Ethereum>,
    {
        if context.private_key.is_none() {
            return Err(BlockchainError::PrivateKeyRequired {
                blockchain: context.name.to_string(),
            });
        }

        let blockchain = context.name.as_str();
        let policy = &context.gas_policy;
        let mut state = TxAttemptState::first();
        let mut nonce = self.pending_nonce(context, provider).await?;
        let mut gas_limit: Option<u64> = None;
        let mut submitted: Vec<B256> = Vec::new();

        loop {
            let network_price = match state.last_error {
                None => self.network_gas_price(context, provider).await,
                Some(_) => None,
            };
            let gas_price = resolve_gas_price(policy, &state, network_price);
            record_blockchain_gas_price(blockchain, function, gas_price);

            let mut call = build_call()
                .with_cloned_provider()
                .from(context.public_key)
                .nonce(nonce)
                .gas_price(gas_price);

            if gas_limit.is_none() {
                let started = Instant::now();
                match call.estimate_gas().await {
                    Ok(estimate) => {
                        record_blockchain_tx_stage(
                            blockchain,
                            function,
                            "estimate_gas",
                            "ok",
                            started.elapsed(),
                        );
                        gas_limit = Some(apply_gas_estimate_multiplier(
                            estimate,
                            policy.gas_estimate_multiplier,
                        ));
                    }
                    Err(err) => {
                        record_blockchain_tx_stage(
                            blockchain,
                            function,
                            "estimate_gas",
                            "error",
                            started.elapsed(),
                        );
                        if is_retryable_contract_error(&err) && state.has_attempts_left(policy) {
                            state = state.next(TxRetryReason::Transient, gas_price);
                            self.wait_before_retry(context, contract, function, &state, &err)
                                .await;
                            continue;
                        }
                        return Err(contract_call_failed(contract, function, err));
                    }
                }
            }

            if let Some(gas_limit) = gas_limit {
                call = call.gas(gas_limit);
            }

            tracing::debug!(
                blockchain = %context.name,
                contract = %contract,
                function,
                attempt = state.attempt,
                nonce,
                gas_price,
                "Sending transaction"
            );

            let started = Instant::now();
            let pending = match call.send().await {
                Ok(pending) => {
                    record_blockchain_tx_stage(
                        blockchain,
                        function,
                        "send",
                        "ok",
                        started.elapsed(),
                    );
                    pending
                }
                Err(err) => {
                    record_blockchain_tx_stage(
                        blockchain,
                        function,
                        "send",
                        "error",
                        started.elapsed(),
                    );
                    let reason = classify_tx_error(&err);

                    if reason == Some(TxRetryReason::NonceTooLow)
                        && let Some(receipt) = self.find_mined(provider, &submitted).await
                    {
                        return ensure_success(contract, function, receipt);
                    }

                    match reason {
                        Some(reason) if state.has_attempts_left(policy) => {
                            if reason.refreshes_nonce() {
                                nonce = self.pending_nonce(context, provider).await?;
                            }
                            state = state.next(reason, gas_price);
                            self.wait_before_retry(context, contract, function, &state, &err)
                                .await;
                            continue;
                        }
                        _ => return Err(contract_call_failed(contract, function, err)),
                    }
                }
            };

            let tx_hash = *pending.tx_hash();
            submitted.push(tx_hash);

            let started = Instant::now();
            let receipt = pending
                .with_required_confirmations(context.tx_confirmations)
                .with_timeout(context.tx_receipt_timeout())
                .get_receipt()
                .await;

            match receipt {
                Ok(receipt) => {
                    record_blockchain_tx_stage(
                        blockchain,
                        function,
                        "receipt",
                        "ok",
                        started.elapsed(),
                    );
                    return ensure_success(contract, function, receipt);
                }
                Err(err) => {
                    record_blockchain_tx_stage(
                        blockchain,
                        function,
                        "receipt",
                        "error",
                        started.elapsed(),
                    );
                    match classify_receipt_error(&err) {
                        Some(reason) if state.has_attempts_left(policy) => {
                            record_blockchain_tx_retry(blockchain, function, reason.as_str());
                            tracing::warn!(
                                blockchain = %context.name,
                                contract = %contract,
                                function,
                                %tx_hash,
                                attempt = state.attempt,
                                reason = %reason,
                                error = %err,
                                "Transaction receipt not available; replacing"
                            );
                            state = state.next(reason, gas_price);
                        }
                        _ => {
                            tracing::error!(
                                blockchain = %context.name,
                                %tx_hash,
                                error = %err,
                                "Failed to retrieve transaction receipt"
                            );
                            return Err(BlockchainError::ReceiptFailed {
                                reason: err.to_string(),
                            });
                        }
                    }
                }
            }
        }
    }

    async fn wait_before_retry(
        &self,
        context: &BlockchainContext,
        contract: ContractName,
        function: &'static str,
        state: &TxAttemptState,
        err: &ContractError,
    ) {
        let reason = state.last_error.unwrap_or(TxRetryReason::Transient);
        record_blockchain_tx_retry(context.name.as_str(), function, reason.as_str());

        let delay = self.tx_retry_policy.delay_after(
            state.attempt.saturating_sub(1),
            contract_error_backoff_hint(err),
        );
        tracing::warn!(
            blockchain = %context.name,
            contract = %contract,
            function,
            attempt = state.attempt,
            max_attempts = context.gas_policy.max_tx_attempts,
            delay_ms = delay.as_millis(),
            reason = %reason,
            error = %err,
            "Transaction attempt failed; retrying"
        );
        tokio::time::sleep(delay).await;
    }

    async fn pending_nonce(
        &self,
        context: &BlockchainContext,
        provider: &BlockchainProvider,
    ) -> Result<u64, BlockchainError> {
        let from: Address = context.public_key;
        let nonce = self
            .rpc_call(context, "get_transaction_count", || async {
                provider.get_transaction_count(from).pending().await
            })
            .await?;
        Ok(nonce)
    }

    async fn network_gas_price(
        &self,
        context: &BlockchainContext,
        provider: &BlockchainProvider,
    ) -> Option<u128> {
        match self
            .rpc_call(context, "get_gas_price", || async {
                provider.get_gas_price().await
            })
            .await
        {
            Ok(price) => Some(price),
            Err(e) => {
                tracing::warn!(
                    blockchain = %context.name,
                    error = %e,
                    "Failed to get network gas price; using default"
                );
                None
            }
        }
    }

    /// One of our earlier attempts may have been mined while we were replacing it.
    async fn find_mined(
        &self,
        provider: &BlockchainProvider,
        submitted: &[B256],
    ) -> Option<TransactionReceipt> {
        for tx_hash in submitted.iter().rev() {
            if let Ok(Some(receipt)) = provider.get_transaction_receipt(*tx_hash).await {
                return Some(receipt);
            }
        }
        None
    }
}

fn ensure_success(
    contract: ContractName,
    function: &'static str,
    receipt: TransactionReceipt,
) -> Result<TransactionReceipt, BlockchainError> {
    if receipt.status() {
        return Ok(receipt);
    }

    Err(BlockchainError::TransactionFailed {
        contract: contract.to_string(),
        function: function.to_string(),
        reason: format!("transaction {} reverted", receipt.transaction_hash),
    })
}

fn contract_call_failed(
    contract: ContractName,
    function: &'static str,
    err: ContractError,
) -> BlockchainError {
    match revert_reason(&err) {
        Some(reason) => {
            tracing::error!(contract = %contract, function, %reason, "Contract call reverted");
            BlockchainError::TransactionFailed {
                contract: contract.to_string(),
                function: function.to_string(),
                reason,
            }
        }
        None => {
            tracing::error!(contract = %contract, function, error = %err, "Contract call failed");
            BlockchainError::Contract(err)
        }
    }
}
