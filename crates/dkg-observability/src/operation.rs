use std::time::Duration;

use metrics::{counter, histogram};

pub fn record_operation_poll(operation: &str, status: &str) {
    counter!(
        "dkg_client_operation_polls_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_operation_duration(operation: &str, status: &str, duration: Duration) {
    histogram!(
        "dkg_client_operation_duration_seconds",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());
}

pub fn record_operation_retries_exhausted(operation: &str) {
    counter!(
        "dkg_client_operation_retries_exhausted_total",
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// Duration of one stage of a `create` flow (canonicalize, partition, publish, mint, ...).
pub fn record_publish_stage(stage: &str, status: &str, duration: Duration) {
    histogram!(
        "dkg_client_publish_stage_duration_seconds",
        "stage" => stage.to_string(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());
}

pub fn record_dataset_size(byte_size: usize, chunk_count: usize) {
    histogram!("dkg_client_dataset_bytes").record(byte_size as f64);
    histogram!("dkg_client_dataset_chunks").record(chunk_count as f64);
}

pub fn record_finality_result(blockchain_id: &str, status: &str, confirmations: u64) {
    counter!(
        "dkg_client_finality_total",
        "blockchain_id" => blockchain_id.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "dkg_client_finality_confirmations",
        "blockchain_id" => blockchain_id.to_string()
    )
    .record(confirmations as f64);
}
