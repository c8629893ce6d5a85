use serde::{Deserialize, Serialize};
use validator::ValidationError;
use validator_derive::Validate;

fn validate_public_non_empty(public: &[String]) -> Result<(), ValidationError> {
    if public.is_empty() {
        let mut error = ValidationError::new("public_non_empty");
        error.message = Some("public statements must contain at least one statement".into());
        return Err(error);
    }
    Ok(())
}

/// A partitioned dataset ready for commitment.
///
/// `public` is grouped by subject with groups in lexicographic order and
/// already carries the private commitment and cross-reference statements.
/// `private` holds the grouped private statements that are sent to the node
/// but never committed on chain directly.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, Validate)]
pub struct Assertion {
    #[validate(custom(function = "validate_public_non_empty"))]
    pub public: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<Vec<String>>,
}

impl Assertion {
    pub fn new(public: Vec<String>, private: Option<Vec<String>>) -> Self {
        Self { public, private }
    }

    pub fn private_statements(&self) -> &[String] {
        self.private.as_deref().unwrap_or_default()
    }

    pub fn has_private(&self) -> bool {
        !self.private_statements().is_empty()
    }
}
