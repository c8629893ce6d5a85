use alloy::{
    network::EthereumWallet,
    primitives::Address,
    signers::local::{LocalSignerError, PrivateKeySigner},
};

use crate::{config::BlockchainContext, error::BlockchainError};

pub(crate) fn signer_from_private_key(
    private_key: &str,
) -> Result<PrivateKeySigner, BlockchainError> {
    private_key
        .parse()
        .map_err(|e: LocalSignerError| BlockchainError::InvalidPrivateKey {
            key_length: private_key.len(),
            source: e,
        })
}

/// Signing wallet for the context. The key must belong to `public_key`,
/// since that address is the payer for allowance checks.
pub(crate) fn wallet_for_context(
    context: &BlockchainContext,
) -> Result<Option<EthereumWallet>, BlockchainError> {
    let Some(private_key) = context.private_key.as_deref() else {
        return Ok(None);
    };

    let signer = signer_from_private_key(private_key)?;
    ensure_signer_matches(signer.address(), context.public_key)?;
    Ok(Some(EthereumWallet::from(signer)))
}

fn ensure_signer_matches(signer: Address, configured: Address) -> Result<(), BlockchainError> {
    if configured != Address::ZERO && signer != configured {
        return Err(BlockchainError::WalletMismatch { signer, configured });
    }
    Ok(())
}
