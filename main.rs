//! Permit Relayer Server
//!
//! A standalone relayer executing signed permits and authorized deposits on
//! behalf of token owners, over an in-memory dev ledger.
//!
//! ## Configuration
//!
//! - `VERIFIER_ADDRESS`: address of the verifier/depositor (required)
//! - `RELAYER_ADDRESS`: identity the relayer executes permits as (required)
//! - `ASSET_ADDRESS`: token accepted by the depositor (required)
//! - `BIND_ADDRESS`: listen address (default `0.0.0.0:3000`)
//! - `PERMIT_DOMAIN_NAME` / `PERMIT_DOMAIN_VERSION`: EIP-712 domain (default `ApprovalTarget` / `1`)
//! - `CHAIN_ID`: chain the relayer signs for (default `31337`)
//! - `DEV_ACCOUNTS`: `0xaddr=amount,...` accounts funded at startup

use permit_transfer::server::{create_router, RelayerState};
use permit_transfer::{RelayerConfig, Result};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = RelayerConfig::from_env()?;
    let bind_address = config.bind_address.clone();

    tracing::info!(
        "Permit domain {} v{} on chain {} at {:?}",
        config.domain.name,
        config.domain.version,
        config.domain.chain_id,
        config.domain.verifying_contract
    );
    tracing::info!("Relaying as {:?}", config.relayer);

    let state = RelayerState::with_dev_ledger(config)?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("🚀 Permit relayer listening on {}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
