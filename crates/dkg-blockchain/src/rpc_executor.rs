use std::{future::IntoFuture, time::Duration};

use alloy::{
    contract::Error as ContractError,
    transports::{RpcError, TransportErrorKind},
};
use tokio::time::sleep;

use crate::error_classification::{
    contract_error_backoff_hint, is_retryable_contract_error, is_retryable_rpc_error,
    rpc_backoff_hint,
};

/// Bounded exponential backoff for ledger calls.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RetryPolicy {
    /// Total calls, including the first.
    pub attempts: u32,
    pub initial_delay: Duration,
    pub delay_cap: Duration,
}

impl RetryPolicy {
    /// Read calls: contract lookups, asks, allowance and receipt queries.
    pub(crate) const fn reads() -> Self {
        Self {
            attempts: 3,
            initial_delay: Duration::from_millis(200),
            delay_cap: Duration::from_secs(2),
        }
    }

    /// Pauses between transaction send attempts.
    pub(crate) const fn transactions() -> Self {
        Self {
            attempts: 3,
            initial_delay: Duration::from_millis(500),
            delay_cap: Duration::from_secs(5),
        }
    }

    /// Delay after the `failed`-th failure. Doubles each time up to the cap;
    /// a provider hint replaces the computed value but is still capped.
    pub(crate) fn delay_after(&self, failed: u32, hint: Option<Duration>) -> Duration {
        let delay = hint.unwrap_or_else(|| {
            let doublings = failed.saturating_sub(1).min(16);
            self.initial_delay.saturating_mul(1 << doublings)
        });
        delay.min(self.delay_cap)
    }
}

pub(crate) trait RetryableError: std::fmt::Display {
    fn is_retryable(&self) -> bool;

    fn backoff_hint(&self) -> Option<Duration> {
        None
    }
}

impl RetryableError for RpcError<TransportErrorKind> {
    fn is_retryable(&self) -> bool {
        is_retryable_rpc_error(self)
    }

    fn backoff_hint(&self) -> Option<Duration> {
        rpc_backoff_hint(self)
    }
}

impl RetryableError for ContractError {
    fn is_retryable(&self) -> bool {
        is_retryable_contract_error(self)
    }

    fn backoff_hint(&self) -> Option<Duration> {
        contract_error_backoff_hint(self)
    }
}

/// Runs `call` until it succeeds, fails with a permanent error, or the
/// policy's attempts are used up. The last error is returned as is.
pub(crate) async fn retry<T, E, F, O>(policy: RetryPolicy, label: &str, mut call: F) -> Result<T, E>
where
    E: RetryableError,
    F: FnMut() -> O,
    O: IntoFuture<Output = Result<T, E>>,
{
    let mut failed = 0;

    loop {
        let err = match call().into_future().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        failed += 1;
        if failed >= policy.attempts || !err.is_retryable() {
            return Err(err);
        }

        let delay = policy.delay_after(failed, err.backoff_hint());
        tracing::warn!(
            call = label,
            attempt = failed,
            attempts = policy.attempts,
            delay_ms = delay.as_millis(),
            error = %err,
            "Ledger call failed; retrying"
        );
        sleep(delay).await;
    }
}
