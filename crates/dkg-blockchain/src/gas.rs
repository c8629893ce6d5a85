//! Legacy gas pricing across transaction attempts.
//!
//! Pricing is a pure function of the policy, the state carried over from the
//! previous attempt, and whatever the network quoted for this attempt. The
//! send loop owns the state and threads it through explicitly.

use std::fmt;

use crate::config::GasPolicy;

/// Why the previous send attempt has to be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxRetryReason {
    /// Receipt did not arrive within the timeout.
    NotMined,
    /// The node already has a transaction with this nonce and payload.
    AlreadyKnown,
    /// A pending transaction with this nonce pays more.
    Underpriced,
    /// Fee below the node or block minimum.
    FeeTooLow,
    /// The nonce was consumed, usually by a concurrent sender.
    NonceTooLow,
    /// Rate limiting or a dropped connection.
    Transient,
}

impl TxRetryReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxRetryReason::NotMined => "not_mined",
            TxRetryReason::AlreadyKnown => "already_known",
            TxRetryReason::Underpriced => "underpriced",
            TxRetryReason::FeeTooLow => "fee_too_low",
            TxRetryReason::NonceTooLow => "nonce_too_low",
            TxRetryReason::Transient => "transient",
        }
    }

    /// The retry replaces a transaction still sitting in the mempool.
    pub fn requires_replacement(&self) -> bool {
        matches!(
            self,
            TxRetryReason::NotMined | TxRetryReason::AlreadyKnown | TxRetryReason::Underpriced
        )
    }

    pub fn bumps_gas_price(&self) -> bool {
        !matches!(self, TxRetryReason::Transient | TxRetryReason::NonceTooLow)
    }

    /// A fresh nonce must be fetched before the next attempt.
    pub fn refreshes_nonce(&self) -> bool {
        matches!(self, TxRetryReason::NonceTooLow)
    }
}

impl fmt::Display for TxRetryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the send loop remembers between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxAttemptState {
    /// 1-based.
    pub attempt: u32,
    pub last_error: Option<TxRetryReason>,
    pub last_gas_price: Option<u128>,
}

impl Default for TxAttemptState {
    fn default() -> Self {
        Self::first()
    }
}

impl TxAttemptState {
    pub fn first() -> Self {
        Self {
            attempt: 1,
            last_error: None,
            last_gas_price: None,
        }
    }

    pub fn next(self, reason: TxRetryReason, gas_price: u128) -> Self {
        Self {
            attempt: self.attempt.saturating_add(1),
            last_error: Some(reason),
            last_gas_price: Some(gas_price),
        }
    }

    pub fn has_attempts_left(&self, policy: &GasPolicy) -> bool {
        self.attempt < policy.max_tx_attempts
    }
}

/// Picks the gas price for the attempt described by `state`.
///
/// Priority: forced replacement price, bumped previous price, network quote,
/// static default. The result never exceeds `max_gas_price`.
pub fn resolve_gas_price(
    policy: &GasPolicy,
    state: &TxAttemptState,
    network_price: Option<u128>,
) -> u128 {
    let quoted = network_price
        .filter(|price| *price > 0)
        .unwrap_or(u128::from(policy.default_gas_price));

    let price = match state.last_error {
        None => quoted,
        Some(reason) => match (policy.forced_replacement_gas_price, state.last_gas_price) {
            (Some(forced), _) if reason.requires_replacement() => u128::from(forced),
            (_, Some(last)) if reason.bumps_gas_price() => bump(last, policy.bump_factor),
            (_, Some(last)) => last,
            (_, None) => quoted,
        },
    };

    price.min(u128::from(policy.max_gas_price))
}

/// Scales `price` by `factor`, always moving up by at least one wei.
pub fn bump(price: u128, factor: f64) -> u128 {
    let scaled = (price as f64 * factor).ceil();
    if !scaled.is_finite() || scaled >= u128::MAX as f64 {
        return u128::MAX;
    }
    (scaled as u128).max(price.saturating_add(1))
}

pub fn apply_gas_estimate_multiplier(estimate: u64, multiplier: f64) -> u64 {
    if estimate == 0 {
        return 0;
    }

    let scaled = (estimate as f64 * multiplier).ceil();
    if !scaled.is_finite() || scaled <= 0.0 {
        return estimate;
    }

    let scaled = scaled.min(u64::MAX as f64) as u64;
    scaled.max(estimate)
}
