use thiserror::Error;

/// Failures raised while parsing, converting or canonicalizing an RDF dataset.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CanonizeError {
    #[error("Parsing error: {0}")]
    Parsing(String),

    #[error("Hashing error: {0}")]
    Hashing(String),

    #[error("Serialization error: {0}")]
    Serializing(String),

    #[error("JSON-LD error: {0}")]
    JsonLd(String),
}
