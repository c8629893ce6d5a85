//! Per-call options and their resolution.
//!
//! Every call merges, in priority order: the option set at the call site, the
//! client's configured [`ClientDefaults`], and the built-in defaults those were
//! layered on when the configuration was loaded.

use std::time::Duration;

use alloy::primitives::{Address, U256};
use dkg_domain::{ContentType, PollPolicy};

use super::ClientDefaults;
use crate::error::DkgError;

/// Polling overrides shared by every operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollOptions {
    pub max_number_of_retries: Option<u32>,
    pub frequency: Option<Duration>,
}

impl PollOptions {
    fn resolve(&self, defaults: &ClientDefaults) -> Result<PollPolicy, DkgError> {
        let policy = defaults.poll_policy();
        let frequency = self.frequency.unwrap_or(policy.frequency);
        if frequency.is_zero() {
            return Err(DkgError::Validation(
                "Polling frequency must be positive".to_string(),
            ));
        }
        Ok(PollPolicy::new(
            frequency,
            self.max_number_of_retries.unwrap_or(policy.max_retries),
        ))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublishOptions {
    pub epochs_num: Option<u64>,
    pub hash_function_id: Option<u8>,
    pub immutable: Option<bool>,
    pub token_amount: Option<U256>,
    pub paymaster: Option<Address>,
    pub minimum_number_of_node_replications: Option<u32>,
    pub minimum_number_of_finalization_confirmations: Option<u32>,
    pub max_dataset_byte_size: Option<usize>,
    pub poll: PollOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPublishOptions {
    pub epochs_num: u64,
    pub hash_function_id: u8,
    pub immutable: bool,
    pub token_amount: Option<U256>,
    pub paymaster: Address,
    pub minimum_number_of_node_replications: Option<u32>,
    pub minimum_number_of_finalization_confirmations: u32,
    pub max_dataset_byte_size: usize,
    pub poll: PollPolicy,
}

pub fn resolve_publish(
    options: &PublishOptions,
    defaults: &ClientDefaults,
) -> Result<ResolvedPublishOptions, DkgError> {
    let epochs_num = options.epochs_num.unwrap_or(defaults.epochs_num);
    if epochs_num == 0 {
        return Err(DkgError::Validation(
            "epochsNum must be at least 1".to_string(),
        ));
    }

    let minimum_number_of_node_replications = options
        .minimum_number_of_node_replications
        .or(defaults.minimum_number_of_node_replications);
    if minimum_number_of_node_replications == Some(0) {
        return Err(DkgError::Validation(
            "minimumNumberOfNodeReplications must be positive".to_string(),
        ));
    }

    Ok(ResolvedPublishOptions {
        epochs_num,
        hash_function_id: options
            .hash_function_id
            .unwrap_or(defaults.hash_function_id),
        immutable: options.immutable.unwrap_or(defaults.immutable),
        token_amount: options.token_amount.or(defaults.token_amount),
        paymaster: options.paymaster.unwrap_or(defaults.paymaster),
        minimum_number_of_node_replications,
        minimum_number_of_finalization_confirmations: options
            .minimum_number_of_finalization_confirmations
            .unwrap_or(defaults.minimum_number_of_finalization_confirmations),
        max_dataset_byte_size: options
            .max_dataset_byte_size
            .unwrap_or(defaults.max_dataset_byte_size),
        poll: options.poll.resolve(defaults)?,
    })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetOptions {
    pub content_type: Option<ContentType>,
    pub include_metadata: Option<bool>,
    pub hash_function_id: Option<u8>,
    pub validate: Option<bool>,
    pub paranet_ual: Option<String>,
    /// Treat the UAL as a subject UAL rather than a collection UAL.
    pub subject_ual: bool,
    pub poll: PollOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedGetOptions {
    pub content_type: ContentType,
    pub include_metadata: bool,
    pub hash_function_id: u8,
    pub validate: bool,
    pub paranet_ual: Option<String>,
    pub subject_ual: bool,
    pub poll: PollPolicy,
}

pub fn resolve_get(
    options: &GetOptions,
    defaults: &ClientDefaults,
) -> Result<ResolvedGetOptions, DkgError> {
    Ok(ResolvedGetOptions {
        content_type: options.content_type.unwrap_or(defaults.content_type),
        include_metadata: options
            .include_metadata
            .unwrap_or(defaults.include_metadata),
        hash_function_id: options
            .hash_function_id
            .unwrap_or(defaults.hash_function_id),
        validate: options.validate.unwrap_or(defaults.validate),
        paranet_ual: options
            .paranet_ual
            .clone()
            .or_else(|| defaults.paranet_ual.clone()),
        subject_ual: options.subject_ual,
        poll: options.poll.resolve(defaults)?,
    })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    /// SELECT, CONSTRUCT, ...
    pub query_type: Option<String>,
    pub repository: Option<String>,
    pub paranet_ual: Option<String>,
    pub poll: PollOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedQueryOptions {
    pub query_type: String,
    pub repository: Option<String>,
    pub paranet_ual: Option<String>,
    pub poll: PollPolicy,
}

pub fn resolve_query(
    options: &QueryOptions,
    defaults: &ClientDefaults,
) -> Result<ResolvedQueryOptions, DkgError> {
    Ok(ResolvedQueryOptions {
        query_type: options
            .query_type
            .clone()
            .unwrap_or_else(|| defaults.query_type.clone())
            .to_uppercase(),
        repository: options
            .repository
            .clone()
            .or_else(|| defaults.repository.clone()),
        paranet_ual: options
            .paranet_ual
            .clone()
            .or_else(|| defaults.paranet_ual.clone()),
        poll: options.poll.resolve(defaults)?,
    })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalStoreOptions {
    pub max_dataset_byte_size: Option<usize>,
    pub poll: PollOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocalStoreOptions {
    pub max_dataset_byte_size: usize,
    pub poll: PollPolicy,
}

pub fn resolve_local_store(
    options: &LocalStoreOptions,
    defaults: &ClientDefaults,
) -> Result<ResolvedLocalStoreOptions, DkgError> {
    Ok(ResolvedLocalStoreOptions {
        max_dataset_byte_size: options
            .max_dataset_byte_size
            .unwrap_or(defaults.max_dataset_byte_size),
        poll: options.poll.resolve(defaults)?,
    })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinalityOptions {
    pub minimum_number_of_node_replications: Option<u32>,
    pub minimum_number_of_finalization_confirmations: Option<u32>,
    pub poll: PollOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFinalityOptions {
    pub minimum_number_of_node_replications: Option<u32>,
    pub minimum_number_of_finalization_confirmations: u32,
    pub poll: PollPolicy,
}

pub fn resolve_finality(
    options: &FinalityOptions,
    defaults: &ClientDefaults,
) -> Result<ResolvedFinalityOptions, DkgError> {
    Ok(ResolvedFinalityOptions {
        minimum_number_of_node_replications: options
            .minimum_number_of_node_replications
            .or(defaults.minimum_number_of_node_replications),
        minimum_number_of_finalization_confirmations: options
            .minimum_number_of_finalization_confirmations
            .unwrap_or(defaults.minimum_number_of_finalization_confirmations),
        poll: options.poll.resolve(defaults)?,
    })
}
