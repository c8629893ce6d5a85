//! Typed defaults, the lowest configuration layer.

use alloy::primitives::Address;
use dkg_blockchain::{BlockchainContext, GasPolicy};
use dkg_domain::{
    ContentType, DEFAULT_MAX_DATASET_BYTE_SIZE, constants::DEFAULT_HASH_FUNCTION_ID,
};

use super::{ClientConfig, ClientDefaults, NodeConfig};
use crate::logger::{LogFormat, LoggerConfig, TelemetryConfig, TelemetryMetricsConfig};

pub const DEFAULT_NODE_PORT: u16 = 8900;
pub const DEFAULT_EPOCHS_NUM: u64 = 2;
pub const DEFAULT_MAX_NUMBER_OF_RETRIES: u32 = 5;
pub const DEFAULT_FREQUENCY_MS: u64 = 5_000;
pub const DEFAULT_FINALIZATION_CONFIRMATIONS: u32 = 3;

pub fn client_config() -> ClientConfig {
    ClientConfig {
        node: node(),
        blockchain: blockchain(),
        defaults: client_defaults(),
        logger: logger(),
        telemetry: telemetry(),
    }
}

pub fn node() -> NodeConfig {
    NodeConfig {
        endpoint: "http://localhost".to_string(),
        port: DEFAULT_NODE_PORT,
        auth_token: None,
        request_timeout_ms: 60_000,
    }
}

fn blockchain() -> BlockchainContext {
    BlockchainContext {
        gas_policy: GasPolicy::default(),
        ..BlockchainContext::default()
    }
}

pub fn client_defaults() -> ClientDefaults {
    ClientDefaults {
        epochs_num: DEFAULT_EPOCHS_NUM,
        hash_function_id: DEFAULT_HASH_FUNCTION_ID,
        immutable: false,
        token_amount: None,
        paymaster: Address::ZERO,
        minimum_number_of_node_replications: None,
        minimum_number_of_finalization_confirmations: DEFAULT_FINALIZATION_CONFIRMATIONS,
        max_number_of_retries: DEFAULT_MAX_NUMBER_OF_RETRIES,
        frequency_ms: DEFAULT_FREQUENCY_MS,
        content_type: ContentType::All,
        include_metadata: false,
        validate: true,
        max_dataset_byte_size: DEFAULT_MAX_DATASET_BYTE_SIZE,
        query_type: "SELECT".to_string(),
        repository: None,
        paranet_ual: None,
    }
}

fn logger() -> LoggerConfig {
    LoggerConfig {
        level: "dkg_client=info,dkg_blockchain=info".to_string(),
        format: LogFormat::Pretty,
    }
}

fn telemetry() -> TelemetryConfig {
    TelemetryConfig {
        metrics: TelemetryMetricsConfig {
            enabled: false,
            bind_address: "127.0.0.1:9464".to_string(),
        },
    }
}
