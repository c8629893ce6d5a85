use std::time::Duration;

use alloy::{
    contract::Error as ContractError,
    providers::{PendingTransactionError, WatchTxError},
    sol_types::decode_revert_reason,
    transports::{RpcError, TransportErrorKind},
};

use crate::gas::TxRetryReason;

/// Node error fragments mapped to the retry they call for. Checked in order,
/// so the more specific fragments come first.
const TX_RETRY_PATTERNS: [(&str, TxRetryReason); 12] = [
    ("transaction was not mined", TxRetryReason::NotMined),
    ("already known", TxRetryReason::AlreadyKnown),
    ("replacement transaction underpriced", TxRetryReason::Underpriced),
    ("replacement fee too low", TxRetryReason::Underpriced),
    ("transaction underpriced", TxRetryReason::FeeTooLow),
    ("max fee per gas less than block base fee", TxRetryReason::FeeTooLow),
    ("max fee per gas less than block basefee", TxRetryReason::FeeTooLow),
    ("priority fee too low", TxRetryReason::FeeTooLow),
    ("fee too low", TxRetryReason::FeeTooLow),
    ("nonce too low", TxRetryReason::NonceTooLow),
    ("nonce is too low", TxRetryReason::NonceTooLow),
    ("nonce has already been used", TxRetryReason::NonceTooLow),
];

pub fn is_retryable_rpc_error(err: &RpcError<TransportErrorKind>) -> bool {
    match err {
        RpcError::Transport(kind) => match kind {
            TransportErrorKind::MissingBatchResponse(_) | TransportErrorKind::BackendGone => true,
            TransportErrorKind::HttpError(http) => {
                http.is_rate_limit_err() || http.is_temporarily_unavailable()
            }
            TransportErrorKind::Custom(custom) => {
                let msg = custom.to_string().to_ascii_lowercase();
                msg.contains("too many requests") || msg.contains("rate limit")
            }
            _ => false,
        },
        RpcError::ErrorResp(payload) => payload.is_retry_err(),
        RpcError::NullResp => true,
        RpcError::DeserError { text, .. } => {
            let lowered = text.to_ascii_lowercase();
            lowered.contains("rate limit") || lowered.contains("too many requests")
        }
        _ => false,
    }
}

/// Some providers ask for a specific backoff in the error payload.
pub fn rpc_backoff_hint(err: &RpcError<TransportErrorKind>) -> Option<Duration> {
    let RpcError::ErrorResp(payload) = err else {
        return None;
    };

    let Ok(data) = payload.try_data_as::<serde_json::Value>()? else {
        return None;
    };

    let backoff_seconds = data["rate"]["backoff_seconds"].as_f64()?;
    Some(Duration::from_secs(backoff_seconds.ceil() as u64))
}

pub fn is_retryable_contract_error(err: &ContractError) -> bool {
    if err.as_revert_data().is_some() {
        return false;
    }

    match err {
        ContractError::TransportError(inner) => is_retryable_rpc_error(inner),
        ContractError::PendingTransactionError(PendingTransactionError::TransportError(inner)) => {
            is_retryable_rpc_error(inner)
        }
        _ => false,
    }
}

pub fn contract_error_backoff_hint(err: &ContractError) -> Option<Duration> {
    match err {
        ContractError::TransportError(inner)
        | ContractError::PendingTransactionError(PendingTransactionError::TransportError(inner)) => {
            rpc_backoff_hint(inner)
        }
        _ => None,
    }
}

/// Decides whether a failed send is worth another attempt. Reverts never are.
pub fn classify_tx_error(err: &ContractError) -> Option<TxRetryReason> {
    if err.as_revert_data().is_some() {
        return None;
    }

    classify_tx_message(&contract_error_message(err)).or_else(|| {
        is_retryable_contract_error(err).then_some(TxRetryReason::Transient)
    })
}

/// Receipt timeouts mean the transaction is still pending and must be replaced.
pub fn classify_receipt_error(err: &PendingTransactionError) -> Option<TxRetryReason> {
    match err {
        PendingTransactionError::TxWatcher(WatchTxError::Timeout) => Some(TxRetryReason::NotMined),
        PendingTransactionError::TransportError(inner) => classify_tx_message(
            &rpc_error_message(inner),
        )
        .or_else(|| is_retryable_rpc_error(inner).then_some(TxRetryReason::Transient)),
        _ => classify_tx_message(&err.to_string()),
    }
}

/// Human-readable revert reason (`Error(string)`, `Panic(uint256)`) if the
/// call reverted with one.
pub fn revert_reason(err: &ContractError) -> Option<String> {
    let data = err.as_revert_data()?;
    decode_revert_reason(&data).or_else(|| Some(format!("reverted with data {data}")))
}

pub fn classify_tx_message(message: &str) -> Option<TxRetryReason> {
    let message = message.to_ascii_lowercase();
    TX_RETRY_PATTERNS
        .iter()
        .find(|(pattern, _)| message.contains(pattern))
        .map(|(_, reason)| *reason)
}

fn contract_error_message(err: &ContractError) -> String {
    match err {
        ContractError::TransportError(inner) => rpc_error_message(inner),
        ContractError::PendingTransactionError(inner) => inner.to_string(),
        _ => err.to_string(),
    }
}

fn rpc_error_message(err: &RpcError<TransportErrorKind>) -> String {
    match err {
        RpcError::ErrorResp(payload) => payload.to_string(),
        RpcError::Transport(TransportErrorKind::HttpError(http)) => http.body.clone(),
        RpcError::Transport(TransportErrorKind::Custom(custom)) => custom.to_string(),
        RpcError::DeserError { text, .. } => text.clone(),
        _ => err.to_string(),
    }
}
