mod assertion;
mod blockchain_id;
pub mod constants;
mod kc;
pub mod merkle;
mod operation;
mod signature;
pub mod size;
mod ual;

pub use assertion::Assertion;
pub use blockchain_id::BlockchainId;
pub use kc::{CreatedKnowledgeCollection, KnowledgeCollectionRequest};
pub use merkle::{
    MerkleError, MerkleProof, calculate_merkle_proof, calculate_merkle_root, verify_merkle_proof,
};
pub use operation::{
    ContentType, DKG_CLIENT_ERROR, FinalityOutcome, FinalityStatus, MAX_RETRIES_REACHED_MESSAGE,
    OperationKind, OperationResult, OperationStatus, PollPolicy, PublishOperationData,
};
pub use signature::NodeSignature;
pub use size::{
    CHUNK_BYTE_SIZE, DEFAULT_MAX_DATASET_BYTE_SIZE, SizeLimitExceeded, calculate_assertion_size,
    calculate_byte_size, calculate_chunk_count, ensure_within_size_limit,
};
pub use ual::{Ual, UalParseError, derive_ual, parse_ual};
