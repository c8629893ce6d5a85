use alloy::{
    primitives::{Address, B256, U256, Uint},
    rpc::types::TransactionReceipt,
    sol_types::SolEvent,
};
use dkg_domain::{CreatedKnowledgeCollection, KnowledgeCollectionRequest};
use dkg_observability::record_allowance_adjustment;

use super::{
    EvmRegistrar,
    contracts::{ContractName, KnowledgeCollection, KnowledgeCollectionStorage, Token},
    provider::{self, BlockchainProvider},
};
use crate::{config::BlockchainContext, error::BlockchainError};

type IdentityId = Uint<72, 2>;

/// Narrows a value to a contract parameter width, rejecting overflow.
pub fn checked_uint<const BITS: usize, const LIMBS: usize>(
    value: U256,
    field: &'static str,
) -> Result<Uint<BITS, LIMBS>, BlockchainError> {
    if value.bit_len() > BITS {
        return Err(BlockchainError::ValueOutOfRange { field, value });
    }
    Ok(Uint::from_limbs_slice(&value.as_limbs()[..LIMBS]))
}

/// How much allowance must be added before spending `required`.
pub fn allowance_gap(required: U256, current: U256) -> Option<U256> {
    (required > current).then(|| required - current)
}

/// `createKnowledgeCollection` arguments, range-checked once up front.
struct CreateArgs {
    publish_operation_id: String,
    merkle_root: B256,
    knowledge_assets_amount: U256,
    byte_size: Uint<88, 2>,
    epochs: Uint<40, 1>,
    token_amount: Uint<96, 2>,
    is_immutable: bool,
    paymaster: Address,
    publisher_identity_id: IdentityId,
    publisher_r: B256,
    publisher_vs: B256,
    identity_ids: Vec<IdentityId>,
    rs: Vec<B256>,
    vss: Vec<B256>,
}

impl TryFrom<&KnowledgeCollectionRequest> for CreateArgs {
    type Error = BlockchainError;

    fn try_from(request: &KnowledgeCollectionRequest) -> Result<Self, Self::Error> {
        let identity_ids = request
            .signatures
            .iter()
            .map(|signature| checked_uint(U256::from(signature.identity_id), "identityIds"))
            .collect::<Result<Vec<IdentityId>, _>>()?;

        Ok(Self {
            publish_operation_id: request.publish_operation_id.clone(),
            merkle_root: request.merkle_root,
            knowledge_assets_amount: U256::from(request.knowledge_assets_amount),
            byte_size: checked_uint(U256::from(request.byte_size), "byteSize")?,
            epochs: checked_uint(U256::from(request.epochs), "epochs")?,
            token_amount: checked_uint(request.token_amount, "tokenAmount")?,
            is_immutable: request.is_immutable,
            paymaster: request.paymaster,
            publisher_identity_id: checked_uint(
                U256::from(request.publisher_node_signature.identity_id),
                "publisherNodeIdentityId",
            )?,
            publisher_r: request.publisher_node_signature.r,
            publisher_vs: request.publisher_node_signature.vs,
            identity_ids,
            rs: request.signatures.iter().map(|s| s.r).collect(),
            vss: request.signatures.iter().map(|s| s.vs).collect(),
        })
    }
}

impl EvmRegistrar {
    pub(crate) async fn mint_knowledge_collection(
        &self,
        request: &KnowledgeCollectionRequest,
        context: &BlockchainContext,
    ) -> Result<CreatedKnowledgeCollection, BlockchainError> {
        let args = CreateArgs::try_from(request)?;
        let provider = provider::connect(context).await?;

        let kc_address = self
            .contract_address(context, &provider, ContractName::KnowledgeCollection)
            .await?;
        let storage_address = self
            .contract_address(context, &provider, ContractName::KnowledgeCollectionStorage)
            .await?;

        let increased = self
            .ensure_allowance(context, &provider, kc_address, request.token_amount)
            .await?;

        let knowledge_collection = KnowledgeCollection::new(kc_address, provider.clone());
        let minted = self
            .send_transaction(
                context,
                &provider,
                ContractName::KnowledgeCollection,
                "createKnowledgeCollection",
                || {
                    knowledge_collection.createKnowledgeCollection(
                        args.publish_operation_id.clone(),
                        args.merkle_root,
                        args.knowledge_assets_amount,
                        args.byte_size,
                        args.epochs,
                        args.token_amount,
                        args.is_immutable,
                        args.paymaster,
                        args.publisher_identity_id,
                        args.publisher_r,
                        args.publisher_vs,
                        args.identity_ids.clone(),
                        args.rs.clone(),
                        args.vss.clone(),
                    )
                },
            )
            .await;

        let receipt = match minted {
            Ok(receipt) => receipt,
            Err(err) => {
                if let Some(gap) = increased {
                    self.revert_allowance(context, &provider, kc_address, gap)
                        .await;
                }
                return Err(err);
            }
        };

        let knowledge_collection_id = decode_created_id(&receipt, storage_address)?;
        let block_number = receipt.block_number;

        if context.wait_for_block_finalization
            && let Some(block) = block_number
        {
            self.wait_for_finalized_block(context, &provider, block)
                .await?;
        }

        tracing::info!(
            blockchain = %context.name,
            knowledge_collection_id,
            tx_hash = %receipt.transaction_hash,
            "Knowledge collection created"
        );

        Ok(CreatedKnowledgeCollection {
            knowledge_collection_id,
            storage_contract: storage_address,
            transaction_hash: receipt.transaction_hash,
            block_number,
        })
    }

    /// Raises the payer's allowance to cover `required`. Returns the amount
    /// added, if any.
    async fn ensure_allowance(
        &self,
        context: &BlockchainContext,
        provider: &BlockchainProvider,
        spender: Address,
        required: U256,
    ) -> Result<Option<U256>, BlockchainError> {
        let token_address = self
            .contract_address(context, provider, ContractName::Token)
            .await?;
        let token = Token::new(token_address, provider.clone());
        let owner = context.public_key;

        let current = self
            .rpc_call(context, "token_allowance", || async {
                token.allowance(owner, spender).call().await
            })
            .await?;

        let Some(gap) = allowance_gap(required, current) else {
            tracing::debug!(
                blockchain = %context.name,
                %current,
                %required,
                "Allowance sufficient"
            );
            return Ok(None);
        };

        tracing::debug!(blockchain = %context.name, %gap, "Increasing allowance");
        self.send_transaction(
            context,
            provider,
            ContractName::Token,
            "increaseAllowance",
            || token.increaseAllowance(spender, gap),
        )
        .await?;
        record_allowance_adjustment(context.name.as_str(), "increase");

        Ok(Some(gap))
    }

    /// Best effort; the mint error is what the caller needs to see.
    async fn revert_allowance(
        &self,
        context: &BlockchainContext,
        provider: &BlockchainProvider,
        spender: Address,
        gap: U256,
    ) {
        let token_address = match self
            .contract_address(context, provider, ContractName::Token)
            .await
        {
            Ok(address) => address,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot resolve Token to revert allowance");
                return;
            }
        };
        let token = Token::new(token_address, provider.clone());

        match self
            .send_transaction(
                context,
                provider,
                ContractName::Token,
                "decreaseAllowance",
                || token.decreaseAllowance(spender, gap),
            )
            .await
        {
            Ok(_) => record_allowance_adjustment(context.name.as_str(), "decrease"),
            Err(e) => tracing::warn!(
                blockchain = %context.name,
                %gap,
                error = %e,
                "Failed to revert allowance after unsuccessful mint"
            ),
        }
    }
}

fn decode_created_id(
    receipt: &TransactionReceipt,
    storage_address: Address,
) -> Result<u128, BlockchainError> {
    let id = receipt
        .inner
        .logs()
        .iter()
        .filter(|log| log.address() == storage_address)
        .find_map(|log| {
            KnowledgeCollectionStorage::KnowledgeCollectionCreated::decode_log(log.as_ref())
                .ok()
                .map(|decoded| decoded.data.id)
        })
        .ok_or_else(|| BlockchainError::EventNotFound {
            event: "KnowledgeCollectionCreated".to_string(),
            tx_hash: receipt.transaction_hash,
        })?;

    u128::try_from(id).map_err(|_| BlockchainError::ValueOutOfRange {
        field: "knowledgeCollectionId",
        value: id,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use dkg_domain::NodeSignature;

    use super::*;

    fn signature(identity_id: u128) -> NodeSignature {
        NodeSignature {
            identity_id,
            r: B256::repeat_byte(0x11),
            vs: B256::repeat_byte(0x22),
        }
    }

    fn request() -> KnowledgeCollectionRequest {
        KnowledgeCollectionRequest {
            publish_operation_id: "op".to_string(),
            merkle_root: B256::repeat_byte(0xab),
            knowledge_assets_amount: 2,
            byte_size: 1_024,
            epochs: 2,
            token_amount: U256::from(10u64).pow(U256::from(18u64)),
            is_immutable: false,
            paymaster: Address::ZERO,
            publisher_node_signature: signature(1),
            signatures: vec![signature(1), signature(2)],
        }
    }

    #[test]
    fn test_checked_uint_bounds() {
        let max_u40 = U256::from((1u64 << 40) - 1);
        let narrowed: Uint<40, 1> = checked_uint(max_u40, "epochs").unwrap();
        assert_eq!(narrowed.to::<u64>(), (1u64 << 40) - 1);

        let overflow = checked_uint::<40, 1>(U256::from(1u64 << 40), "epochs");
        assert!(matches!(
            overflow,
            Err(BlockchainError::ValueOutOfRange { field: "epochs", .. })
        ));

        let wide: Uint<96, 2> = checked_uint(U256::from(u64::MAX) + U256::from(1u64), "x").unwrap();
        assert_eq!(U256::from(wide), U256::from(u64::MAX) + U256::from(1u64));
    }

    #[test]
    fn test_allowance_gap() {
        assert_eq!(
            allowance_gap(U256::from(100u64), U256::from(40u64)),
            Some(U256::from(60u64))
        );
        assert_eq!(allowance_gap(U256::from(100u64), U256::from(100u64)), None);
        assert_eq!(allowance_gap(U256::from(100u64), U256::from(500u64)), None);
    }

    #[test]
    fn test_create_args_from_request() {
        let args = CreateArgs::try_from(&request()).unwrap();
        assert_eq!(args.identity_ids.len(), 2);
        assert_eq!(args.rs, vec![B256::repeat_byte(0x11); 2]);
        assert_eq!(args.knowledge_assets_amount, U256::from(2u64));

        let too_expensive = KnowledgeCollectionRequest {
            token_amount: U256::MAX,
            ..request()
        };
        assert!(matches!(
            CreateArgs::try_from(&too_expensive),
            Err(BlockchainError::ValueOutOfRange {
                field: "tokenAmount",
                ..
            })
        ));
    }
}
