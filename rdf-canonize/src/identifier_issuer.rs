use std::collections::HashMap;

/// Issues sequential identifiers (`<prefix><counter>`) and remembers which
/// source identifier each one was issued for, in issuance order.
#[derive(Clone, Debug)]
pub(crate) struct IdentifierIssuer {
    prefix: String,
    counter: usize,
    existing: HashMap<String, String>,
    order: Vec<String>,
}

impl IdentifierIssuer {
    pub(crate) fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            counter: 0,
            existing: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Returns the identifier issued for `old`, issuing a new one if needed.
    /// `None` always issues a fresh identifier that is not recorded.
    pub(crate) fn get_id(&mut self, old: Option<&str>) -> String {
        if let Some(old) = old
            && let Some(existing) = self.existing.get(old)
        {
            return existing.clone();
        }

        let identifier = format!("{}{}", self.prefix, self.counter);
        self.counter += 1;

        if let Some(old) = old {
            self.existing.insert(old.to_string(), identifier.clone());
            self.order.push(old.to_string());
        }

        identifier
    }

    /// Identifier already issued for `old`, without issuing one.
    pub(crate) fn issued(&self, old: &str) -> Option<&str> {
        self.existing.get(old).map(String::as_str)
    }

    pub(crate) fn has_id(&self, old: &str) -> bool {
        self.existing.contains_key(old)
    }

    /// Source identifiers in the order they were issued.
    pub(crate) fn old_ids(&self) -> &[String] {
        &self.order
    }
}
