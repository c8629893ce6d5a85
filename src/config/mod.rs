//! Client configuration.
//!
//! Layering, lowest priority first: typed defaults from [`defaults`], an
//! optional TOML file, then `DKG_`-prefixed environment variables (nested keys
//! separated by `__`, e.g. `DKG_NODE__PORT=8900`). Per-call options are merged
//! over the loaded [`ClientDefaults`] by [`options`].

pub mod defaults;
mod error;
mod loader;
pub mod options;

use std::time::Duration;

use alloy::primitives::{Address, U256};
use dkg_blockchain::BlockchainContext;
use dkg_domain::{ContentType, PollPolicy};
use serde::{Deserialize, Serialize};
use validator::Validate;
use validator_derive::Validate;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_env};

use crate::logger::{LoggerConfig, TelemetryConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[validate(nested)]
    pub node: NodeConfig,
    #[validate(nested)]
    pub blockchain: BlockchainContext,
    #[validate(nested)]
    pub defaults: ClientDefaults,
    pub logger: LoggerConfig,
    pub telemetry: TelemetryConfig,
}

/// Where the DKG node's HTTP API lives.
#[derive(Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    /// Scheme and host, e.g. "http://localhost".
    #[validate(length(min = 1))]
    pub endpoint: String,
    #[validate(range(min = 1))]
    pub port: u16,
    /// Sent as `Authorization: Bearer <token>` when set.
    pub auth_token: Option<String>,
    #[validate(range(min = 1))]
    pub request_timeout_ms: u64,
}

impl NodeConfig {
    pub fn base_url(&self) -> String {
        format!("{}:{}", self.endpoint.trim_end_matches('/'), self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl std::fmt::Debug for NodeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeConfig")
            .field("endpoint", &self.endpoint)
            .field("port", &self.port)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

/// Client-wide defaults for per-call options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ClientDefaults {
    #[validate(range(min = 1))]
    pub epochs_num: u64,
    pub hash_function_id: u8,
    pub immutable: bool,
    /// Overrides the ask-based token amount when set.
    pub token_amount: Option<U256>,
    pub paymaster: Address,
    pub minimum_number_of_node_replications: Option<u32>,
    /// 0 skips finality tracking after publish.
    pub minimum_number_of_finalization_confirmations: u32,
    pub max_number_of_retries: u32,
    #[validate(range(min = 1))]
    pub frequency_ms: u64,
    pub content_type: ContentType,
    pub include_metadata: bool,
    /// Compare fetched data against the on-chain Merkle root.
    pub validate: bool,
    #[validate(range(min = 1))]
    pub max_dataset_byte_size: usize,
    pub query_type: String,
    pub repository: Option<String>,
    pub paranet_ual: Option<String>,
}

impl ClientDefaults {
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            frequency: Duration::from_millis(self.frequency_ms),
            max_retries: self.max_number_of_retries,
        }
    }
}
