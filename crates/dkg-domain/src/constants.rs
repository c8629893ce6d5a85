/// Predicate of the public statement committing to the private Merkle root.
pub const PRIVATE_ASSERTION_PREDICATE: &str =
    "https://ontology.origintrail.io/dkg/1.0#privateMerkleRoot";

/// Predicate linking a subject to the private resource it represents.
pub const PRIVATE_RESOURCE_PREDICATE: &str =
    "https://ontology.origintrail.io/dkg/1.0#representsPrivateResource";

/// Subject prefix for private subjects that have no public counterpart.
pub const PRIVATE_HASH_SUBJECT_PREFIX: &str =
    "https://ontology.origintrail.io/dkg/1.0#metadata-hash:";

/// Hash function id sent with publish and get (1 = SHA-256).
pub const DEFAULT_HASH_FUNCTION_ID: u8 = 1;
