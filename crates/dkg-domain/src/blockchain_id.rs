use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, de::Error as _};

/// Blockchain network identifier in `name:chainId` form (e.g. "base:8453",
/// "gnosis:100", "otp:2043"). Stored lowercase.
///
/// `From` conversions accept any string; deserialization and `FromStr` reject
/// identifiers that [`BlockchainId::is_well_formed`] refuses.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct BlockchainId(String);

impl BlockchainId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Network name without the chain ID ("base" for "base:8453").
    pub fn name(&self) -> &str {
        self.0.split(':').next().unwrap_or(&self.0)
    }

    /// Numeric chain ID, if present and valid.
    pub fn chain_id(&self) -> Option<u64> {
        self.0.split(':').nth(1).and_then(|s| s.parse().ok())
    }

    /// Non-empty name, a single `:` and a numeric chain ID. Only such
    /// identifiers survive a UAL round trip.
    pub fn is_well_formed(&self) -> bool {
        is_well_formed(&self.0)
    }
}

fn is_well_formed(value: &str) -> bool {
    match value.split_once(':') {
        Some((name, chain_id)) => !name.is_empty() && chain_id.parse::<u64>().is_ok(),
        None => false,
    }
}

impl fmt::Display for BlockchainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for BlockchainId {
    fn from(value: String) -> Self {
        Self(value.to_lowercase())
    }
}

impl From<&str> for BlockchainId {
    fn from(value: &str) -> Self {
        Self(value.to_lowercase())
    }
}

/// Strict parse: requires a non-empty name and a numeric chain ID.
impl FromStr for BlockchainId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if is_well_formed(s) {
            Ok(Self::from(s))
        } else {
            Err(format!("'{s}' is not a valid blockchain identifier"))
        }
    }
}

impl<'de> Deserialize<'de> for BlockchainId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer)?
            .parse()
            .map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_components() {
        let id: BlockchainId = "Gnosis:100".parse().unwrap();
        assert_eq!(id.as_str(), "gnosis:100");
        assert_eq!(id.name(), "gnosis");
        assert_eq!(id.chain_id(), Some(100));
    }

    #[test]
    fn test_strict_parse() {
        assert!("otp".parse::<BlockchainId>().is_err());
        assert!("otp:abc".parse::<BlockchainId>().is_err());
        assert!(":2043".parse::<BlockchainId>().is_err());
    }

    #[test]
    fn test_deserialize_is_strict() {
        let id: BlockchainId = serde_json::from_str("\"Base:8453\"").unwrap();
        assert_eq!(id.as_str(), "base:8453");
        assert!(serde_json::from_str::<BlockchainId>("\"otp\"").is_err());
        assert!(!BlockchainId::from("otp").is_well_formed());
    }
}
