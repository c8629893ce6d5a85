//! RDF dataset canonicalization (URDNA2015) for N-Quads and JSON-LD input.

mod error;
mod identifier_issuer;
mod json_ld;
mod message_digest;
mod n_quad;
mod permuter;
mod urdna2015;

pub use error::CanonizeError;
pub use json_ld::to_rdf;
pub use n_quad::{Literal, NQuads, Quad, Term, TermType};
use urdna2015::Urdna2015;

/// Canonicalizes an N-Quads document. The output is sorted, deduplicated and
/// uses `_:c14nN` blank node labels, one `" .\n"`-terminated line per quad.
pub fn canonize(input: &str) -> Result<String, CanonizeError> {
    canonize_quads(NQuads::parse(input)?)
}

pub fn canonize_quads(quads: Vec<Quad>) -> Result<String, CanonizeError> {
    Urdna2015::new(quads).main()
}

pub fn canonize_json_ld(document: &serde_json::Value) -> Result<String, CanonizeError> {
    canonize_quads(to_rdf(document)?)
}
