//! URDNA2015 canonicalization of an RDF dataset.
//!
//! Blank nodes are relabeled `_:c14nN` so that isomorphic datasets serialize
//! to identical, sorted N-Quads text.

use std::collections::{HashMap, HashSet};

use crate::{
    error::CanonizeError,
    identifier_issuer::IdentifierIssuer,
    message_digest::MessageDigest,
    n_quad::{NQuads, Quad, Term},
    permuter::Permuter,
};

const CANONICAL_PREFIX: &str = "_:c14n";
const TEMPORARY_PREFIX: &str = "_:b";

#[derive(Default)]
struct BlankNodeInfo {
    /// Indices into the deduplicated dataset.
    quads: Vec<usize>,
    hash: Option<String>,
}

pub(crate) struct Urdna2015 {
    quads: Vec<Quad>,
    canonical_issuer: IdentifierIssuer,
    blank_node_info: HashMap<String, BlankNodeInfo>,
    deep_iterations: HashMap<String, usize>,
    max_deep_iterations: usize,
}

impl Urdna2015 {
    pub(crate) fn new(dataset: Vec<Quad>) -> Self {
        let mut seen = HashSet::new();
        let quads: Vec<Quad> = dataset
            .into_iter()
            .filter(|quad| seen.insert(quad.clone()))
            .collect();

        Self {
            quads,
            canonical_issuer: IdentifierIssuer::new(CANONICAL_PREFIX),
            blank_node_info: HashMap::new(),
            deep_iterations: HashMap::new(),
            max_deep_iterations: 0,
        }
    }

    /// Runs the algorithm and returns the canonical N-Quads document.
    pub(crate) fn main(mut self) -> Result<String, CanonizeError> {
        let mut non_normalized: Vec<String> = Vec::new();
        for (index, quad) in self.quads.iter().enumerate() {
            for term in [quad.subject(), quad.object(), quad.graph()] {
                if !term.is_blank() {
                    continue;
                }
                let info = self
                    .blank_node_info
                    .entry(term.value().to_string())
                    .or_insert_with(|| {
                        non_normalized.push(term.value().to_string());
                        BlankNodeInfo::default()
                    });
                if info.quads.last() != Some(&index) {
                    info.quads.push(index);
                }
            }
        }

        self.max_deep_iterations = non_normalized.len().saturating_pow(2).max(1);

        let mut hash_to_blank_nodes: HashMap<String, Vec<String>> = HashMap::new();
        for id in &non_normalized {
            let hash = self.hash_first_degree_quads(id)?;
            hash_to_blank_nodes
                .entry(hash)
                .or_default()
                .push(id.clone());
        }

        let mut hashes: Vec<String> = hash_to_blank_nodes.keys().cloned().collect();
        hashes.sort();

        let mut non_unique = Vec::new();
        for hash in hashes {
            let Some(id_list) = hash_to_blank_nodes.remove(&hash) else {
                continue;
            };
            if id_list.len() > 1 {
                non_unique.push(id_list);
            } else {
                self.canonical_issuer.get_id(Some(&id_list[0]));
            }
        }

        for id_list in non_unique {
            let mut hash_path_list = Vec::new();

            for id in &id_list {
                if self.canonical_issuer.has_id(id) {
                    continue;
                }

                let mut issuer = IdentifierIssuer::new(TEMPORARY_PREFIX);
                issuer.get_id(Some(id));
                hash_path_list.push(self.hash_ndegree_quads(id, issuer)?);
            }

            hash_path_list.sort_by(|a, b| a.0.cmp(&b.0));

            for (_, issuer) in hash_path_list {
                for old_id in issuer.old_ids() {
                    self.canonical_issuer.get_id(Some(old_id));
                }
            }
        }

        let mut normalized = Vec::with_capacity(self.quads.len());
        for quad in &self.quads {
            let relabeled = quad.map_blank_nodes(|label| {
                self.canonical_issuer
                    .issued(label)
                    .unwrap_or(label)
                    .to_string()
            });
            normalized.push(NQuads::serialize_quad(&relabeled)?);
        }

        normalized.sort();
        Ok(normalized.concat())
    }

    fn hash_first_degree_quads(&mut self, id: &str) -> Result<String, CanonizeError> {
        let info = self
            .blank_node_info
            .get(id)
            .ok_or_else(|| CanonizeError::Hashing(format!("Unknown blank node {id}")))?;

        let mut nquads = Vec::with_capacity(info.quads.len());
        for &index in &info.quads {
            let quad = self.quads[index].map_blank_nodes(|label| {
                let substitute = if label == id { "_:a" } else { "_:z" };
                substitute.to_string()
            });
            nquads.push(NQuads::serialize_quad(&quad)?);
        }
        nquads.sort();

        let mut md = MessageDigest::new();
        for nquad in &nquads {
            md.update(nquad);
        }
        let hash = md.digest();

        if let Some(info) = self.blank_node_info.get_mut(id) {
            info.hash = Some(hash.clone());
        }
        Ok(hash)
    }

    fn hash_ndegree_quads(
        &mut self,
        id: &str,
        mut issuer: IdentifierIssuer,
    ) -> Result<(String, IdentifierIssuer), CanonizeError> {
        let iterations = self.deep_iterations.entry(id.to_string()).or_insert(0);
        *iterations += 1;
        if *iterations > self.max_deep_iterations {
            return Err(CanonizeError::Hashing(format!(
                "Maximum deep iterations ({}) exceeded for {id}",
                self.max_deep_iterations
            )));
        }

        let hash_to_related = self.create_hash_to_related(id, &issuer)?;

        let mut hashes: Vec<&String> = hash_to_related.keys().collect();
        hashes.sort();

        let mut md = MessageDigest::new();
        for hash in hashes {
            md.update(hash);

            let mut chosen_path = String::new();
            let mut chosen_issuer: Option<IdentifierIssuer> = None;

            let related_nodes = hash_to_related.get(hash).cloned().unwrap_or_default();
            'permutations: for permutation in Permuter::new(related_nodes) {
                let mut issuer_copy = issuer.clone();
                let mut path = String::new();
                let mut recursion_list = Vec::new();

                for related in &permutation {
                    if let Some(canonical) = self.canonical_issuer.issued(related) {
                        path.push_str(canonical);
                    } else {
                        if !issuer_copy.has_id(related) {
                            recursion_list.push(related.clone());
                        }
                        path.push_str(&issuer_copy.get_id(Some(related)));
                    }

                    if !chosen_path.is_empty() && path > chosen_path {
                        continue 'permutations;
                    }
                }

                for related in recursion_list {
                    let (result_hash, result_issuer) =
                        self.hash_ndegree_quads(&related, issuer_copy.clone())?;
                    issuer_copy = result_issuer;
                    path.push_str(&issuer_copy.get_id(Some(&related)));
                    path.push('<');
                    path.push_str(&result_hash);
                    path.push('>');

                    if !chosen_path.is_empty() && path > chosen_path {
                        continue 'permutations;
                    }
                }

                if chosen_path.is_empty() || path < chosen_path {
                    chosen_path = path;
                    chosen_issuer = Some(issuer_copy);
                }
            }

            md.update(&chosen_path);
            if let Some(chosen) = chosen_issuer {
                issuer = chosen;
            }
        }

        Ok((md.digest(), issuer))
    }

    fn create_hash_to_related(
        &self,
        id: &str,
        issuer: &IdentifierIssuer,
    ) -> Result<HashMap<String, Vec<String>>, CanonizeError> {
        let info = self
            .blank_node_info
            .get(id)
            .ok_or_else(|| CanonizeError::Hashing(format!("Unknown blank node {id}")))?;

        let mut hash_to_related: HashMap<String, Vec<String>> = HashMap::new();
        for &index in &info.quads {
            let quad = &self.quads[index];
            for (term, position) in [
                (quad.subject(), "s"),
                (quad.object(), "o"),
                (quad.graph(), "g"),
            ] {
                if !term.is_blank() || term.value() == id {
                    continue;
                }
                let hash = self.hash_related_blank_node(term, quad, issuer, position)?;
                hash_to_related
                    .entry(hash)
                    .or_default()
                    .push(term.value().to_string());
            }
        }

        Ok(hash_to_related)
    }

    fn hash_related_blank_node(
        &self,
        related: &Term,
        quad: &Quad,
        issuer: &IdentifierIssuer,
        position: &str,
    ) -> Result<String, CanonizeError> {
        let label = related.value();
        let identifier = match self
            .canonical_issuer
            .issued(label)
            .or_else(|| issuer.issued(label))
        {
            Some(issued) => issued.to_string(),
            None => self
                .blank_node_info
                .get(label)
                .and_then(|info| info.hash.clone())
                .ok_or_else(|| {
                    CanonizeError::Hashing(format!("No first-degree hash for {label}"))
                })?,
        };

        let mut md = MessageDigest::new();
        md.update(position);
        if position != "g" {
            md.update(&format!("<{}>", quad.predicate().value()));
        }
        md.update(&identifier);
        Ok(md.digest())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn canonize(input: &str) -> String {
        Urdna2015::new(NQuads::parse(input).unwrap()).main().unwrap()
    }

    #[test]
    fn test_ground_dataset_is_sorted() {
        let input = "<http://ex.org/b> <http://ex.org/p> \"2\" .\n<http://ex.org/a> <http://ex.org/p> \"1\" .\n";
        assert_eq!(
            canonize(input),
            "<http://ex.org/a> <http://ex.org/p> \"1\" .\n<http://ex.org/b> <http://ex.org/p> \"2\" .\n"
        );
    }

    #[test]
    fn test_single_blank_node_gets_c14n0() {
        let input = "_:foo <http://ex.org/name> \"Alice\" .\n";
        assert_eq!(canonize(input), "_:c14n0 <http://ex.org/name> \"Alice\" .\n");
    }

    #[test]
    fn test_blank_node_labels_do_not_affect_output() {
        let first = "_:x <http://ex.org/knows> _:y .\n_:x <http://ex.org/name> \"A\" .\n_:y <http://ex.org/name> \"B\" .\n";
        let second = "_:q <http://ex.org/name> \"B\" .\n_:p <http://ex.org/knows> _:q .\n_:p <http://ex.org/name> \"A\" .\n";
        assert_eq!(canonize(first), canonize(second));
    }

    #[test]
    fn test_symmetric_blank_nodes_use_ndegree_hashing() {
        let first = "_:a <http://ex.org/p> _:b .\n_:b <http://ex.org/p> _:a .\n";
        let second = "_:n1 <http://ex.org/p> _:n0 .\n_:n0 <http://ex.org/p> _:n1 .\n";
        let output = canonize(first);
        assert_eq!(output, canonize(second));
        assert_eq!(
            output,
            "_:c14n0 <http://ex.org/p> _:c14n1 .\n_:c14n1 <http://ex.org/p> _:c14n0 .\n"
        );
    }

    #[test]
    fn test_existing_c14n_labels_are_relabeled() {
        let input = "_:c14n7 <http://ex.org/p> \"v\" .\n";
        assert_eq!(canonize(input), "_:c14n0 <http://ex.org/p> \"v\" .\n");
    }
}
