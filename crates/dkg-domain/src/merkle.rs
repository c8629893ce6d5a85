//! Merkle commitment over a statement set.
//!
//! Statements are sorted before hashing. Each leaf binds a statement to its
//! sorted position: `keccak256(keccak256(statement) ‖ uint256(index))`. Parents
//! hash their children in ascending order, so proofs carry no direction bits.
//! A trailing odd node is promoted to the next level unchanged.

use alloy::{
    primitives::{B256, U256, keccak256},
    sol_types::SolValue,
};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MerkleError {
    #[error("No statements to prove")]
    Empty,
    #[error("Leaf index {index} out of range, only {len} leaves exist")]
    IndexOutOfRange { index: usize, len: usize },
}

/// A statement together with the sibling path that proves its inclusion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    /// Statement at `index` in the sorted set
    pub statement: String,
    /// Position in the sorted set
    pub index: usize,
    /// Sibling hashes from leaf level upwards
    pub proof: Vec<B256>,
}

fn sorted(statements: &[String]) -> Vec<&str> {
    let mut sorted: Vec<&str> = statements.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted
}

pub fn leaf_hash(statement: &str, index: usize) -> B256 {
    let packed = (keccak256(statement.as_bytes()), U256::from(index)).abi_encode_packed();
    keccak256(packed)
}

fn hash_pair(left: B256, right: B256) -> B256 {
    let (a, b) = if left <= right {
        (left, right)
    } else {
        (right, left)
    };

    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(a.as_slice());
    buf[32..].copy_from_slice(b.as_slice());
    keccak256(buf)
}

fn next_level(level: &[B256]) -> Vec<B256> {
    level
        .chunks(2)
        .map(|pair| match pair {
            [left, right] => hash_pair(*left, *right),
            // odd node carried up
            _ => pair[0],
        })
        .collect()
}

fn leaves(statements: &[String]) -> Vec<B256> {
    sorted(statements)
        .into_iter()
        .enumerate()
        .map(|(index, statement)| leaf_hash(statement, index))
        .collect()
}

/// Root of the statement set; `B256::ZERO` when the set is empty.
pub fn calculate_merkle_root(statements: &[String]) -> B256 {
    let mut level = leaves(statements);
    if level.is_empty() {
        return B256::ZERO;
    }

    while level.len() > 1 {
        level = next_level(&level);
    }
    level[0]
}

/// Inclusion proof for the statement at `index` of the sorted set.
pub fn calculate_merkle_proof(
    statements: &[String],
    index: usize,
) -> Result<MerkleProof, MerkleError> {
    let sorted = sorted(statements);
    if sorted.is_empty() {
        return Err(MerkleError::Empty);
    }
    if index >= sorted.len() {
        return Err(MerkleError::IndexOutOfRange {
            index,
            len: sorted.len(),
        });
    }

    let mut level: Vec<B256> = sorted
        .iter()
        .enumerate()
        .map(|(i, statement)| leaf_hash(statement, i))
        .collect();
    let mut position = index;
    let mut proof = Vec::new();

    while level.len() > 1 {
        let sibling = position ^ 1;
        if sibling < level.len() {
            proof.push(level[sibling]);
        }
        position /= 2;
        level = next_level(&level);
    }

    Ok(MerkleProof {
        statement: sorted[index].to_string(),
        index,
        proof,
    })
}

pub fn verify_merkle_proof(root: B256, statement: &str, index: usize, proof: &[B256]) -> bool {
    let computed = proof
        .iter()
        .fold(leaf_hash(statement, index), |hash, sibling| {
            hash_pair(hash, *sibling)
        });
    computed == root
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn statements(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn test_empty_root_is_zero() {
        assert_eq!(calculate_merkle_root(&[]), B256::ZERO);
    }

    #[test]
    fn test_single_statement_root_is_its_leaf() {
        let set = statements(&["<a> <b> <c> ."]);
        assert_eq!(calculate_merkle_root(&set), leaf_hash("<a> <b> <c> .", 0));
    }

    #[test]
    fn test_root_ignores_input_order() {
        let set = statements(&["<a> <b> <c> .", "<a> <b> <d> .", "<e> <f> <g> ."]);
        let shuffled = statements(&["<e> <f> <g> .", "<a> <b> <c> .", "<a> <b> <d> ."]);
        assert_eq!(calculate_merkle_root(&set), calculate_merkle_root(&shuffled));
    }

    #[test]
    fn test_root_changes_with_content_or_count() {
        let set = statements(&["<a> <b> <c> .", "<a> <b> <d> ."]);
        let altered = statements(&["<a> <b> <c> .", "<a> <b> <x> ."]);
        let extended = statements(&["<a> <b> <c> .", "<a> <b> <d> .", "<a> <b> <e> ."]);
        let root = calculate_merkle_root(&set);
        assert_ne!(root, calculate_merkle_root(&altered));
        assert_ne!(root, calculate_merkle_root(&extended));
    }

    #[test]
    fn test_duplicate_statements_get_distinct_leaves() {
        assert_ne!(leaf_hash("<a> <b> <c> .", 0), leaf_hash("<a> <b> <c> .", 1));
    }

    #[test]
    fn test_every_proof_verifies() {
        let set = statements(&[
            "<s1> <p> \"1\" .",
            "<s2> <p> \"2\" .",
            "<s3> <p> \"3\" .",
            "<s4> <p> \"4\" .",
            "<s5> <p> \"5\" .",
        ]);
        let root = calculate_merkle_root(&set);

        for index in 0..set.len() {
            let proof = calculate_merkle_proof(&set, index).unwrap();
            assert!(verify_merkle_proof(
                root,
                &proof.statement,
                proof.index,
                &proof.proof
            ));
        }
    }

    #[test]
    fn test_proof_rejects_wrong_index_or_statement() {
        let set = statements(&["<a> <p> \"1\" .", "<b> <p> \"2\" .", "<c> <p> \"3\" ."]);
        let root = calculate_merkle_root(&set);
        let proof = calculate_merkle_proof(&set, 1).unwrap();

        assert!(!verify_merkle_proof(root, &proof.statement, 0, &proof.proof));
        assert!(!verify_merkle_proof(root, "<z> <p> \"9\" .", 1, &proof.proof));
    }

    #[test]
    fn test_proof_index_out_of_range() {
        let set = statements(&["<a> <p> \"1\" ."]);
        assert_eq!(
            calculate_merkle_proof(&set, 3),
            Err(MerkleError::IndexOutOfRange { index: 3, len: 1 })
        );
        assert_eq!(calculate_merkle_proof(&[], 0), Err(MerkleError::Empty));
    }
}
