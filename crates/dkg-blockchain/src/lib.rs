//! Ledger side of knowledge-collection publishing: contract lookup through the
//! Hub, token allowance management, gas-priced transaction retries, and
//! receipt decoding for EVM chains.

mod chains;
mod config;
mod error;
mod error_classification;
mod gas;
mod registrar;
mod rpc_executor;

pub use alloy::primitives::{Address, B256, U256};
pub use chains::evm::{ContractName, EvmRegistrar, allowance_gap, checked_uint};
pub use config::{BlockchainContext, GasPolicy};
pub use dkg_domain::BlockchainId;
pub use error::BlockchainError;
pub use error_classification::{classify_tx_message, revert_reason};
pub use gas::{TxAttemptState, TxRetryReason, bump, resolve_gas_price};
pub use registrar::Registrar;
