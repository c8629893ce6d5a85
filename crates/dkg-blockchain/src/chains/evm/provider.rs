use std::{num::NonZeroUsize, sync::Arc};

use alloy::{
    network::Ethereum,
    providers::{DynProvider, Provider, ProviderBuilder, WsConnect},
    rpc::client::RpcClient,
    transports::{
        BoxTransport, IntoBoxTransport,
        http::{Http, reqwest::Url},
        layers::FallbackLayer,
    },
};
use tower::ServiceBuilder;

use super::wallets::wallet_for_context;
use crate::{config::BlockchainContext, error::BlockchainError};

pub(crate) type BlockchainProvider = Arc<DynProvider<Ethereum>>;

/// Connects to the context's RPC endpoints with failover between them.
/// Read-only when the context carries no private key.
pub(crate) async fn connect(
    context: &BlockchainContext,
) -> Result<BlockchainProvider, BlockchainError> {
    let mut transports: Vec<BoxTransport> = Vec::new();
    let mut valid_endpoints = Vec::new();

    for endpoint in &context.rpc_endpoints {
        if endpoint.starts_with("ws://") || endpoint.starts_with("wss://") {
            match RpcClient::connect_pubsub(WsConnect::new(endpoint)).await {
                Ok(client) => {
                    transports.push(client.transport().clone().into_box_transport());
                    valid_endpoints.push(endpoint.as_str());
                }
                Err(e) => {
                    tracing::warn!(endpoint = %endpoint, error = %e, "WebSocket RPC connect failed");
                }
            }
        } else {
            match endpoint.parse::<Url>() {
                Ok(url) => {
                    transports.push(Http::new(url).into_box_transport());
                    valid_endpoints.push(endpoint.as_str());
                }
                Err(e) => {
                    tracing::warn!(endpoint = %endpoint, error = %e, "Invalid RPC URL");
                }
            }
        }
    }

    if transports.is_empty() {
        return Err(BlockchainError::RpcConnectionFailed {
            attempts: context.rpc_endpoints.len(),
        });
    }

    // One transport at a time; the next is used only on failure.
    let fallback_layer = FallbackLayer::default().with_active_transport_count(NonZeroUsize::MIN);
    let transport = ServiceBuilder::new()
        .layer(fallback_layer)
        .service(transports);
    let client = RpcClient::builder().transport(transport, false);

    let provider = match wallet_for_context(context)? {
        Some(wallet) => ProviderBuilder::new()
            .wallet(wallet)
            .connect_client(client)
            .erased(),
        None => ProviderBuilder::new().connect_client(client).erased(),
    };

    match provider.get_block_number().await {
        Ok(block) => {
            tracing::debug!(
                blockchain = %context.name,
                block,
                endpoints = ?valid_endpoints,
                "Blockchain provider connected"
            );
            Ok(Arc::new(provider))
        }
        Err(e) => {
            tracing::error!(
                blockchain = %context.name,
                error = %e,
                "All RPC endpoints failed connectivity check"
            );
            Err(BlockchainError::RpcConnectionFailed {
                attempts: valid_endpoints.len(),
            })
        }
    }
}
