use std::time::Duration;

use metrics::{counter, histogram};

pub fn record_blockchain_rpc_call(
    blockchain_id: &str,
    operation: &str,
    status: &str,
    duration: Duration,
) {
    counter!(
        "dkg_client_blockchain_rpc_total",
        "blockchain_id" => blockchain_id.to_string(),
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "dkg_client_blockchain_rpc_duration_seconds",
        "blockchain_id" => blockchain_id.to_string(),
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());
}

pub fn record_blockchain_tx_stage(
    blockchain_id: &str,
    operation: &str,
    stage: &str,
    status: &str,
    duration: Duration,
) {
    counter!(
        "dkg_client_blockchain_tx_stage_total",
        "blockchain_id" => blockchain_id.to_string(),
        "operation" => operation.to_string(),
        "stage" => stage.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "dkg_client_blockchain_tx_stage_duration_seconds",
        "blockchain_id" => blockchain_id.to_string(),
        "operation" => operation.to_string(),
        "stage" => stage.to_string(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());
}

pub fn record_blockchain_tx_retry(blockchain_id: &str, operation: &str, reason: &str) {
    counter!(
        "dkg_client_blockchain_tx_retries_total",
        "blockchain_id" => blockchain_id.to_string(),
        "operation" => operation.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

pub fn record_blockchain_gas_price(blockchain_id: &str, operation: &str, gas_price_wei: u128) {
    histogram!(
        "dkg_client_blockchain_gas_price_gwei",
        "blockchain_id" => blockchain_id.to_string(),
        "operation" => operation.to_string()
    )
    .record(gas_price_wei as f64 / 1e9);
}

pub fn record_allowance_adjustment(blockchain_id: &str, direction: &str) {
    counter!(
        "dkg_client_allowance_adjustments_total",
        "blockchain_id" => blockchain_id.to_string(),
        "direction" => direction.to_string()
    )
    .increment(1);
}
