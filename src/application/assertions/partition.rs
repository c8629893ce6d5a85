//! Public/private partitioning of a dataset.
//!
//! Private statements never appear in the public set. Instead the public set
//! carries a commitment to the private Merkle root plus one cross-reference
//! per private subject: inside the matching public group when the subject is
//! shared, or under a hashed placeholder subject otherwise.

use std::collections::{HashMap, HashSet};

use alloy::hex;
use dkg_domain::{
    Assertion, calculate_merkle_root,
    constants::{PRIVATE_ASSERTION_PREDICATE, PRIVATE_HASH_SUBJECT_PREFIX, PRIVATE_RESOURCE_PREDICATE},
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::canonicalize::{Content, canonicalize};
use crate::error::DkgError;

/// Caller content split into the part that is published and the part that
/// stays with the node.
#[derive(Debug, Clone, PartialEq)]
pub struct AssertionContent {
    pub public: Content,
    pub private: Option<Content>,
}

impl AssertionContent {
    pub fn new(public: Content, private: Option<Content>) -> Self {
        Self { public, private }
    }
}

impl From<Content> for AssertionContent {
    fn from(public: Content) -> Self {
        Self::new(public, None)
    }
}

/// Canonicalizes and partitions `content` into a dataset ready for commitment.
pub fn partition(content: &AssertionContent) -> Result<Assertion, DkgError> {
    let mut public = canonicalize(&content.public)?;
    let mut private = match &content.private {
        Some(private) => canonicalize(private)?,
        None => Vec::new(),
    };

    assign_blank_node_ids(&mut public);
    assign_blank_node_ids(&mut private);

    if private.is_empty() {
        return Ok(Assertion::new(group_by_subject(&public).concat(), None));
    }

    let private_groups = group_by_subject(&private);
    let private = private_groups.concat();
    let private_root = calculate_merkle_root(&private);

    public.push(format!(
        "<{}> <{PRIVATE_ASSERTION_PREDICATE}> \"{private_root}\" .",
        fresh_iri()
    ));

    let mut public_groups = group_by_subject(&public);
    let group_index: HashMap<String, usize> = public_groups
        .iter()
        .enumerate()
        .filter_map(|(index, group)| {
            let subject = group.first().and_then(|statement| extract_subject(statement))?;
            Some((subject.to_string(), index))
        })
        .collect();

    let mut placeholders = Vec::new();
    for group in &private_groups {
        let Some(subject) = group.first().and_then(|statement| extract_subject(statement)) else {
            continue;
        };
        let reference = format!("<{PRIVATE_RESOURCE_PREDICATE}> <{}> .", fresh_iri());

        match group_index.get(subject) {
            Some(&index) => {
                insert_sorted(&mut public_groups[index], format!("{subject} {reference}"));
            }
            None => placeholders.push(format!(
                "{} {reference}",
                private_hash_subject(subject)
            )),
        }
    }

    let mut public = public_groups.concat();
    public.extend(placeholders);

    Ok(Assertion::new(public, Some(private)))
}

/// Subject token of a statement line: the bracketed IRI, or the first
/// whitespace-delimited token otherwise.
pub(crate) fn extract_subject(statement: &str) -> Option<&str> {
    let statement = statement.trim();
    if statement.starts_with('<') {
        statement.find('>').map(|end| &statement[..=end])
    } else {
        statement.split_whitespace().next()
    }
}

/// Groups statements by subject. Groups keep first-seen statement order and
/// are ordered by subject.
pub(crate) fn group_by_subject(statements: &[String]) -> Vec<Vec<String>> {
    let mut groups: Vec<(&str, Vec<String>)> = Vec::new();
    let mut subject_to_index: HashMap<&str, usize> = HashMap::new();

    for statement in statements {
        let subject = extract_subject(statement).unwrap_or_default();
        match subject_to_index.get(subject) {
            Some(&index) => groups[index].1.push(statement.clone()),
            None => {
                subject_to_index.insert(subject, groups.len());
                groups.push((subject, vec![statement.clone()]));
            }
        }
    }

    groups.sort_by(|a, b| a.0.cmp(b.0));
    groups.into_iter().map(|(_, group)| group).collect()
}

/// Inserts `statement` into the lexicographically sorted `group`.
pub(crate) fn insert_sorted(group: &mut Vec<String>, statement: String) {
    let position = group.partition_point(|existing| *existing < statement);
    group.insert(position, statement);
}

/// Replaces every blank node label with a fresh `<uuid:...>` IRI, reusing the
/// same IRI for repeated labels. Literals and IRIs are left untouched.
pub(crate) fn assign_blank_node_ids(statements: &mut [String]) {
    let mut issued: HashMap<String, String> = HashMap::new();
    for statement in statements.iter_mut() {
        if statement.contains("_:") {
            *statement = replace_blank_nodes(statement, &mut issued);
        }
    }
}

fn replace_blank_nodes(statement: &str, issued: &mut HashMap<String, String>) -> String {
    let mut output = String::with_capacity(statement.len());
    let mut chars = statement.char_indices().peekable();
    let mut in_literal = false;
    let mut in_iri = false;
    let mut token_start = true;

    while let Some((offset, ch)) = chars.next() {
        if in_literal {
            output.push(ch);
            match ch {
                '\\' => {
                    if let Some((_, escaped)) = chars.next() {
                        output.push(escaped);
                    }
                }
                '"' => in_literal = false,
                _ => {}
            }
            continue;
        }
        if in_iri {
            output.push(ch);
            in_iri = ch != '>';
            continue;
        }

        if token_start && statement[offset..].starts_with("_:") {
            let end = statement[offset..]
                .find(char::is_whitespace)
                .map_or(statement.len(), |length| offset + length);
            let label = &statement[offset..end];
            let iri = issued
                .entry(label.to_string())
                .or_insert_with(fresh_iri);
            output.push('<');
            output.push_str(iri);
            output.push('>');
            while chars.peek().is_some_and(|(next, _)| *next < end) {
                chars.next();
            }
            token_start = false;
            continue;
        }

        match ch {
            '"' => in_literal = true,
            '<' => in_iri = true,
            _ => {}
        }
        token_start = ch.is_whitespace();
        output.push(ch);
    }

    output
}

fn fresh_iri() -> String {
    format!("uuid:{}", Uuid::new_v4())
}

fn private_hash_subject(subject: &str) -> String {
    let bare = subject.trim_start_matches('<').trim_end_matches('>');
    let digest = Sha256::digest(bare.as_bytes());
    format!("<{PRIVATE_HASH_SUBJECT_PREFIX}{}>", hex::encode_prefixed(digest))
}

/// Number of distinct subjects in the public set, excluding private hash
/// placeholders.
pub fn count_distinct_subjects(public: &[String]) -> usize {
    let placeholder = format!("<{PRIVATE_HASH_SUBJECT_PREFIX}");
    public
        .iter()
        .filter_map(|statement| extract_subject(statement))
        .filter(|subject| !subject.starts_with(&placeholder))
        .collect::<HashSet<_>>()
        .len()
}
