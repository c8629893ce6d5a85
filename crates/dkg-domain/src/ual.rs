use std::{fmt, str::FromStr};

use alloy::{hex, primitives::Address};
use thiserror::Error;

use crate::BlockchainId;

const UAL_PREFIX: &str = "did:dkg:";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UalParseError {
    #[error("Invalid UAL format: {0}")]
    Format(String),
    #[error("Invalid blockchain identifier: {0}")]
    Blockchain(String),
    #[error("Invalid contract address: {0}")]
    Contract(String),
    #[error("Invalid knowledge collection ID: {0}")]
    KnowledgeCollectionId(String),
    #[error("Invalid knowledge asset ID: {0}")]
    KnowledgeAssetId(String),
}

/// Universal Asset Locator:
/// `did:dkg:{blockchain}/{contract}/{knowledge_collection_id}[/{knowledge_asset_id}]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ual {
    pub blockchain: BlockchainId,
    pub contract: Address,
    pub knowledge_collection_id: u128,
    pub knowledge_asset_id: Option<u128>,
}

impl Ual {
    pub fn knowledge_collection(
        blockchain: BlockchainId,
        contract: Address,
        knowledge_collection_id: u128,
    ) -> Self {
        Self {
            blockchain,
            contract,
            knowledge_collection_id,
            knowledge_asset_id: None,
        }
    }

    /// UAL of the collection this locator belongs to.
    pub fn collection_ual(&self) -> Ual {
        Self {
            knowledge_asset_id: None,
            ..self.clone()
        }
    }

    /// UAL of one asset within this collection.
    pub fn asset_ual(&self, knowledge_asset_id: u128) -> Ual {
        Self {
            knowledge_asset_id: Some(knowledge_asset_id),
            ..self.clone()
        }
    }
}

impl fmt::Display for Ual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{UAL_PREFIX}{}/{}/{}",
            self.blockchain.as_str().to_lowercase(),
            hex::encode_prefixed(self.contract),
            self.knowledge_collection_id
        )?;
        if let Some(asset_id) = self.knowledge_asset_id {
            write!(f, "/{asset_id}")?;
        }
        Ok(())
    }
}

impl FromStr for Ual {
    type Err = UalParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_ual(s)
    }
}

/// Derives the canonical (lowercase) UAL string for a knowledge collection.
pub fn derive_ual(
    blockchain: &BlockchainId,
    contract: &Address,
    knowledge_collection_id: u128,
) -> String {
    Ual::knowledge_collection(blockchain.clone(), *contract, knowledge_collection_id).to_string()
}

/// Parses a UAL string into its components.
///
/// Examples:
/// - `did:dkg:base:84532/0x1234.../123` (knowledge collection)
/// - `did:dkg:base:84532/0x1234.../123/1` (knowledge asset)
pub fn parse_ual(ual: &str) -> Result<Ual, UalParseError> {
    let body = ual
        .strip_prefix(UAL_PREFIX)
        .ok_or_else(|| UalParseError::Format(format!("UAL must start with {UAL_PREFIX}: {ual}")))?;

    let parts: Vec<&str> = body.split('/').collect();
    if !(3..=4).contains(&parts.len()) {
        return Err(UalParseError::Format(format!(
            "Expected 3 or 4 parts, got {}",
            parts.len()
        )));
    }

    let blockchain: BlockchainId = parts[0]
        .parse()
        .map_err(|_| UalParseError::Blockchain(parts[0].to_string()))?;
    let contract: Address = parts[1]
        .parse()
        .map_err(|_| UalParseError::Contract(parts[1].to_string()))?;
    let knowledge_collection_id = parts[2]
        .parse()
        .map_err(|_| UalParseError::KnowledgeCollectionId(parts[2].to_string()))?;
    let knowledge_asset_id = parts
        .get(3)
        .map(|part| {
            part.parse()
                .map_err(|_| UalParseError::KnowledgeAssetId(part.to_string()))
        })
        .transpose()?;

    Ok(Ual {
        blockchain,
        contract,
        knowledge_collection_id,
        knowledge_asset_id,
    })
}
