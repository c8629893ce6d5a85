//! Normalization of caller content into canonical statement lines.

use serde_json::Value;

use crate::error::DkgError;

/// Graph content accepted by publish and local store.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// N-Quads / N-Triples document.
    NQuads(String),
    /// JSON-LD document.
    JsonLd(Value),
    /// Statement lines that are already normalized. They are trimmed, sorted
    /// and deduplicated but not relabeled.
    Statements(Vec<String>),
}

impl Content {
    fn is_empty(&self) -> bool {
        match self {
            Self::NQuads(text) => text.trim().is_empty(),
            Self::JsonLd(Value::Null) => true,
            Self::JsonLd(Value::Object(map)) => map.is_empty(),
            Self::JsonLd(Value::Array(items)) => items.is_empty(),
            Self::JsonLd(_) => false,
            Self::Statements(lines) => lines.iter().all(|line| line.trim().is_empty()),
        }
    }
}

impl From<Value> for Content {
    fn from(value: Value) -> Self {
        Self::JsonLd(value)
    }
}

impl From<Vec<String>> for Content {
    fn from(lines: Vec<String>) -> Self {
        Self::Statements(lines)
    }
}

/// Canonical, sorted statement lines (no trailing newline) for `content`.
///
/// Blank nodes come out as `_:c14nN`. Empty content yields no statements;
/// non-empty content that yields none is a format error.
pub fn canonicalize(content: &Content) -> Result<Vec<String>, DkgError> {
    let statements = match content {
        Content::NQuads(text) => {
            let document: String = text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(|line| format!("{line}\n"))
                .collect();
            split_lines(&rdf_canonize::canonize(&document)?)
        }
        Content::JsonLd(document) => split_lines(&rdf_canonize::canonize_json_ld(document)?),
        Content::Statements(lines) => normalize_statements(lines)?,
    };

    if statements.is_empty() && !content.is_empty() {
        return Err(DkgError::Format(
            "Content produced no statements".to_string(),
        ));
    }
    Ok(statements)
}

fn split_lines(document: &str) -> Vec<String> {
    document
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_statements(lines: &[String]) -> Result<Vec<String>, DkgError> {
    let mut statements = Vec::with_capacity(lines.len());
    for line in lines.iter().map(|line| line.trim()).filter(|line| !line.is_empty()) {
        if !line.ends_with('.') {
            return Err(DkgError::Format(format!(
                "Statement is not terminated with '.': {line}"
            )));
        }
        statements.push(line.to_string());
    }
    statements.sort();
    statements.dedup();
    Ok(statements)
}
