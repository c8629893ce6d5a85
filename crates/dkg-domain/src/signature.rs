use alloy::primitives::B256;
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};

/// Compact (EIP-2098) signature a node produces over the publish payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeSignature {
    #[serde(deserialize_with = "identity_id_from_string_or_number")]
    pub identity_id: u128,
    pub r: B256,
    pub vs: B256,
}

fn identity_id_from_string_or_number<'de, D>(deserializer: D) -> Result<u128, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(value) => Ok(value.into()),
        Raw::Text(text) => text
            .parse()
            .map_err(|_| D::Error::custom(format!("invalid identity id: {text}"))),
    }
}
