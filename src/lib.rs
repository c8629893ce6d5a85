//! Client library for publishing knowledge collections to a DKG network.
//!
//! Content is canonicalized and partitioned locally, committed with a Merkle
//! root, handed to a node for replication and finally registered on chain.
//! [`DkgClient`] is the entry point.

mod application;
mod client;
pub mod config;
mod error;
pub mod logger;
mod services;

pub use application::{
    GetResult, PublishResult,
    assertions::{
        AssertionContent, Content, PreparedDataset, canonicalize, count_distinct_subjects,
        partition, prepare_dataset,
    },
};
pub use client::DkgClient;
pub use config::{
    ClientConfig, ClientDefaults, ConfigError, NodeConfig, load_config, load_config_from_env,
    options::{
        FinalityOptions, GetOptions, LocalStoreOptions, PollOptions, PublishOptions, QueryOptions,
    },
};
pub use dkg_blockchain::{BlockchainContext, EvmRegistrar, GasPolicy, Registrar};
pub use dkg_domain::{
    Assertion, BlockchainId, ContentType, FinalityOutcome, FinalityStatus, OperationKind,
    OperationResult, OperationStatus, PollPolicy, Ual, calculate_merkle_proof,
    calculate_merkle_root, derive_ual, parse_ual, verify_merkle_proof,
};
pub use error::DkgError;
pub use services::node_api;
