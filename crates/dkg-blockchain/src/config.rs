use std::{fmt, time::Duration};

use alloy::primitives::Address;
use dkg_domain::BlockchainId;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};
use validator_derive::Validate;

fn validate_blockchain_id(name: &BlockchainId) -> Result<(), ValidationError> {
    if name.is_well_formed() {
        return Ok(());
    }
    let mut error = ValidationError::new("blockchain_id");
    error.message = Some(format!("'{name}' is not in name:chainId form").into());
    Err(error)
}

/// Gas pricing and transaction retry settings for one chain.
///
/// Prices are in wei. `u64` holds any realistic legacy gas price and keeps the
/// policy representable in TOML and environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields, default)]
pub struct GasPolicy {
    /// Used when the network gas price is unavailable.
    pub default_gas_price: u64,
    /// Upper bound for any resolved price.
    pub max_gas_price: u64,
    /// Multiplier applied to the previous attempt's price on retry (1.2 = +20%).
    #[validate(range(min = 1.0, max = 10.0))]
    pub bump_factor: f64,
    /// When set, replacement attempts use exactly this price.
    pub forced_replacement_gas_price: Option<u64>,
    /// Total send attempts per transaction, including the first.
    #[validate(range(min = 1, max = 20))]
    pub max_tx_attempts: u32,
    /// Multiplier applied to `eth_estimateGas` results.
    #[validate(range(min = 1.0, max = 5.0))]
    pub gas_estimate_multiplier: f64,
}

impl Default for GasPolicy {
    fn default() -> Self {
        Self {
            // 1 gwei
            default_gas_price: 1_000_000_000,
            // 500 gwei
            max_gas_price: 500_000_000_000,
            bump_factor: 1.2,
            forced_replacement_gas_price: None,
            max_tx_attempts: 3,
            gas_estimate_multiplier: 1.2,
        }
    }
}

/// Everything needed to talk to one ledger. Owned by the caller and passed
/// into every registrar call.
#[derive(Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields, default)]
pub struct BlockchainContext {
    /// Blockchain identifier, e.g. "base:8453".
    #[validate(custom(function = "validate_blockchain_id"))]
    pub name: BlockchainId,
    /// HTTP or WebSocket JSON-RPC endpoints, tried in order with failover.
    #[validate(length(min = 1))]
    pub rpc_endpoints: Vec<String>,
    pub hub_contract: Address,
    /// Address paying for transactions and holding the token allowance.
    pub public_key: Address,
    /// Signing key; read-only calls work without it.
    pub private_key: Option<String>,
    #[validate(nested)]
    pub gas_policy: GasPolicy,
    /// Wait until the mint's block is covered by the `finalized` tag.
    pub wait_for_block_finalization: bool,
    pub tx_confirmations: u64,
    /// 0 disables the timeout.
    pub tx_receipt_timeout_ms: u64,
    pub block_finalization_poll_ms: u64,
    pub block_finalization_timeout_ms: u64,
}

impl Default for BlockchainContext {
    fn default() -> Self {
        Self {
            name: BlockchainId::from("hardhat1:31337"),
            rpc_endpoints: vec!["http://localhost:8545".to_string()],
            hub_contract: Address::ZERO,
            public_key: Address::ZERO,
            private_key: None,
            gas_policy: GasPolicy::default(),
            wait_for_block_finalization: false,
            tx_confirmations: 1,
            tx_receipt_timeout_ms: 300_000,
            block_finalization_poll_ms: 2_000,
            block_finalization_timeout_ms: 600_000,
        }
    }
}

impl BlockchainContext {
    pub fn tx_receipt_timeout(&self) -> Option<Duration> {
        (self.tx_receipt_timeout_ms > 0).then(|| Duration::from_millis(self.tx_receipt_timeout_ms))
    }

    pub fn block_finalization_poll_interval(&self) -> Duration {
        Duration::from_millis(self.block_finalization_poll_ms.max(1))
    }

    pub fn block_finalization_timeout(&self) -> Duration {
        Duration::from_millis(self.block_finalization_timeout_ms)
    }
}

impl fmt::Debug for BlockchainContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockchainContext")
            .field("name", &self.name)
            .field("rpc_endpoints", &self.rpc_endpoints)
            .field("hub_contract", &self.hub_contract)
            .field("public_key", &self.public_key)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("gas_policy", &self.gas_policy)
            .field(
                "wait_for_block_finalization",
                &self.wait_for_block_finalization,
            )
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_private_key() {
        let context = BlockchainContext {
            private_key: Some("0xdeadbeef".to_string()),
            ..Default::default()
        };
        let rendered = format!("{context:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("deadbeef"));
    }

    #[test]
    fn test_validation() {
        assert!(BlockchainContext::default().validate().is_ok());

        let no_endpoints = BlockchainContext {
            rpc_endpoints: vec![],
            ..Default::default()
        };
        assert!(no_endpoints.validate().is_err());

        let shrinking_bump = BlockchainContext {
            gas_policy: GasPolicy {
                bump_factor: 0.5,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(shrinking_bump.validate().is_err());

        let no_chain_id = BlockchainContext {
            name: BlockchainId::from("otp"),
            ..Default::default()
        };
        assert!(no_chain_id.validate().is_err());
    }
}
