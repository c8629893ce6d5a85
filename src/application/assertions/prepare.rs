use alloy::primitives::B256;
use dkg_domain::{
    Assertion, CHUNK_BYTE_SIZE, calculate_assertion_size, calculate_chunk_count,
    calculate_merkle_root, ensure_within_size_limit,
};
use validator::Validate;

use super::partition::{AssertionContent, count_distinct_subjects, partition};
use crate::error::DkgError;

/// A partitioned dataset with its commitment and size accounting.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedDataset {
    pub assertion: Assertion,
    pub dataset_root: B256,
    /// UTF-8 length of the public set; the size ceiling applies to it.
    pub byte_size: usize,
    pub chunk_count: usize,
    /// Chunk-aligned size recorded on the ledger and used for pricing.
    pub assertion_size: usize,
    pub knowledge_assets_amount: usize,
}

/// Partitions `content`, enforces the size ceiling and commits the public set.
pub fn prepare_dataset(
    content: &AssertionContent,
    max_byte_size: usize,
) -> Result<PreparedDataset, DkgError> {
    let assertion = partition(content)?;
    assertion
        .validate()
        .map_err(|e| DkgError::Validation(e.to_string()))?;

    let byte_size = ensure_within_size_limit(&assertion.public, max_byte_size)?;

    Ok(PreparedDataset {
        dataset_root: calculate_merkle_root(&assertion.public),
        chunk_count: calculate_chunk_count(&assertion.public, CHUNK_BYTE_SIZE),
        assertion_size: calculate_assertion_size(&assertion.public, CHUNK_BYTE_SIZE),
        knowledge_assets_amount: count_distinct_subjects(&assertion.public),
        byte_size,
        assertion,
    })
}
