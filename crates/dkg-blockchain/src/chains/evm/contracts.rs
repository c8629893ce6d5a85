use std::{fmt, str::FromStr};

use alloy::sol;

sol! {
    #[sol(rpc)]
    contract Hub {
        function getContractAddress(string memory contractName) external view returns (address);
        function getAssetStorageAddress(string memory assetStorageName) external view returns (address);
    }
}

sol! {
    #[sol(rpc)]
    contract Token {
        function allowance(address owner, address spender) external view returns (uint256);
        function increaseAllowance(address spender, uint256 addedValue) external returns (bool);
        function decreaseAllowance(address spender, uint256 subtractedValue) external returns (bool);
    }
}

// Generated bindings include methods with many parameters; allow for this module.
#[allow(clippy::too_many_arguments)]
pub mod knowledge_collection {
    use alloy::sol;

    sol! {
        #[sol(rpc)]
        contract KnowledgeCollection {
            function createKnowledgeCollection(
                string calldata publishOperationId,
                bytes32 merkleRoot,
                uint256 knowledgeAssetsAmount,
                uint88 byteSize,
                uint40 epochs,
                uint96 tokenAmount,
                bool isImmutable,
                address paymaster,
                uint72 publisherNodeIdentityId,
                bytes32 publisherNodeR,
                bytes32 publisherNodeVS,
                uint72[] calldata identityIds,
                bytes32[] calldata r,
                bytes32[] calldata vs
            ) external returns (uint256);
        }
    }

    sol! {
        #[sol(rpc)]
        #[derive(Debug)]
        contract KnowledgeCollectionStorage {
            event KnowledgeCollectionCreated(
                uint256 indexed id,
                string publishOperationId,
                bytes32 merkleRoot,
                uint88 byteSize,
                uint40 startEpoch,
                uint40 endEpoch,
                uint96 tokenAmount,
                bool isImmutable
            );

            function getLatestMerkleRoot(uint256 id) external view returns (bytes32);
        }
    }
}

pub use knowledge_collection::{KnowledgeCollection, KnowledgeCollectionStorage};

sol! {
    #[sol(rpc)]
    contract AskStorage {
        function getStakeWeightedAverageAsk() external view returns (uint256);
    }
}

/// Contracts the client resolves through the Hub.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContractName {
    Hub,
    Token,
    KnowledgeCollection,
    KnowledgeCollectionStorage,
    AskStorage,
}

impl ContractName {
    /// Everything looked up on the Hub when a context is first seen.
    pub const RESOLVED: [ContractName; 4] = [
        ContractName::Token,
        ContractName::KnowledgeCollection,
        ContractName::KnowledgeCollectionStorage,
        ContractName::AskStorage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContractName::Hub => "Hub",
            ContractName::Token => "Token",
            ContractName::KnowledgeCollection => "KnowledgeCollection",
            ContractName::KnowledgeCollectionStorage => "KnowledgeCollectionStorage",
            ContractName::AskStorage => "AskStorage",
        }
    }

    /// Asset storages are registered separately from plain contracts.
    pub fn is_asset_storage(&self) -> bool {
        matches!(self, ContractName::KnowledgeCollectionStorage)
    }
}

impl fmt::Display for ContractName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Hub" => Ok(ContractName::Hub),
            "Token" => Ok(ContractName::Token),
            "KnowledgeCollection" => Ok(ContractName::KnowledgeCollection),
            "KnowledgeCollectionStorage" => Ok(ContractName::KnowledgeCollectionStorage),
            "AskStorage" => Ok(ContractName::AskStorage),
            _ => Err(format!("'{}' is not a valid contract name", s)),
        }
    }
}
