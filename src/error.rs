use dkg_blockchain::BlockchainError;
use dkg_domain::{SizeLimitExceeded, UalParseError};
use rdf_canonize::CanonizeError;
use thiserror::Error;

use crate::config::ConfigError;

/// Every failure the client reports.
#[derive(Error, Debug)]
pub enum DkgError {
    /// Content could not be parsed or canonicalized.
    #[error("Format error: {0}")]
    Format(String),

    #[error("Size limit exceeded: {0}")]
    SizeLimit(#[from] SizeLimitExceeded),

    /// Caller input rejected before any network call.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The node reported a terminal failure for an operation.
    #[error("Operation {operation} failed: {error_type}: {message}")]
    OperationFailed {
        operation: String,
        error_type: String,
        message: String,
    },

    #[error("Ledger error: {0}")]
    Ledger(#[from] BlockchainError),

    /// HTTP failure talking to the node.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),
}

impl From<CanonizeError> for DkgError {
    fn from(err: CanonizeError) -> Self {
        Self::Format(err.to_string())
    }
}

impl From<UalParseError> for DkgError {
    fn from(err: UalParseError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<reqwest::Error> for DkgError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
