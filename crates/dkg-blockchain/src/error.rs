use alloy::{
    contract::Error as ContractError,
    primitives::{Address, B256, U256},
    signers::local::LocalSignerError,
    transports::{RpcError, TransportErrorKind},
};

#[derive(Debug, thiserror::Error)]
pub enum BlockchainError {
    #[error("Contract error: {0}")]
    Contract(#[from] ContractError),

    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError<TransportErrorKind>),

    #[error("Invalid address: {address}")]
    InvalidAddress { address: String },

    #[error("Invalid private key (length: {key_length})")]
    InvalidPrivateKey {
        key_length: usize,
        #[source]
        source: LocalSignerError,
    },

    #[error("Private key required to send transactions on {blockchain}")]
    PrivateKeyRequired { blockchain: String },

    #[error("Private key address {signer} does not match configured public key {configured}")]
    WalletMismatch { signer: Address, configured: Address },

    #[error("RPC connection failed after trying {attempts} endpoint(s)")]
    RpcConnectionFailed { attempts: usize },

    #[error("Contract {contract} is not registered in hub {hub}")]
    ContractNotFound { contract: String, hub: Address },

    #[error("Transaction failed: {contract}::{function} - {reason}")]
    TransactionFailed {
        contract: String,
        function: String,
        reason: String,
    },

    #[error("Transaction receipt failed: {reason}")]
    ReceiptFailed { reason: String },

    #[error("Event {event} not found in transaction {tx_hash}")]
    EventNotFound { event: String, tx_hash: B256 },

    #[error("Value {value} of {field} does not fit the contract parameter")]
    ValueOutOfRange { field: &'static str, value: U256 },

    #[error("Block {block} was not finalized within {timeout_secs}s")]
    FinalizationTimeout { block: u64, timeout_secs: u64 },
}
