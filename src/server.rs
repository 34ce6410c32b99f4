//! HTTP relayer for signed permits
//!
//! The relayer submits owner-signed permits on their behalf, so owners never
//! send a transaction themselves. It executes every permit as its configured
//! relayer identity, which is therefore the spender owners must sign for
//! when calling `/permit-and-transfer-from`. Deposits go through the
//! embedded [`AuthorizedDepositor`], whose own address is the spender.
//!
//! All state sits behind a single mutex: each request runs to completion,
//! or fails with no effect, before the next one starts.
//!
//! # Endpoints
//!
//! - `POST /permit-and-transfer-from` - execute a permit as the relayer
//! - `POST /deposit-by-sig` - deposit into the depositor's custody
//! - `GET /nonces/{owner}` - next nonce an owner must sign
//! - `GET /balances/{account}` - token balance on the dev ledger
//! - `GET /deposits/{owner}` - amount credited to an owner by the depositor
//! - `GET /domain` - EIP-712 domain owners must sign under
//! - `GET /health` - health check

use crate::config::RelayerConfig;
use crate::crypto::signature::Signature;
use crate::depositor::AuthorizedDepositor;
use crate::token::{Erc20, InMemoryToken};
use crate::types::{CallContext, TransferReceipt};
use crate::{PermitError, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use ethereum_types::{Address, H256, U256};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

/// Shared relayer state
pub type SharedState = Arc<Mutex<RelayerState>>;

/// Everything a relayer call can touch
#[derive(Debug)]
pub struct RelayerState {
    config: RelayerConfig,
    depositor: AuthorizedDepositor,
    token: InMemoryToken,
}

impl RelayerState {
    /// Relayer over an existing token
    pub fn new(config: RelayerConfig, token: InMemoryToken) -> Result<Self> {
        config.validate()?;
        if token.address() != config.asset {
            return Err(PermitError::config(format!(
                "Token {:?} does not match configured asset {:?}",
                token.address(),
                config.asset
            )));
        }

        let depositor = AuthorizedDepositor::new(config.domain.clone(), config.asset);
        Ok(Self {
            config,
            depositor,
            token,
        })
    }

    /// Relayer over a fresh token at the configured asset address, funding
    /// each dev account and approving the verifier for its full balance
    pub fn with_dev_ledger(config: RelayerConfig) -> Result<Self> {
        let mut token = InMemoryToken::new(config.asset, "Dev Token", "DEV");
        let verifier = config.domain.verifying_contract;
        for (account, amount) in &config.dev_accounts {
            token.mint(*account, *amount)?;
            token.approve(*account, verifier, *amount)?;
            tracing::info!("Funded dev account {:?} with {}", account, amount);
        }
        Self::new(config, token)
    }

    pub fn config(&self) -> &RelayerConfig {
        &self.config
    }

    pub fn depositor(&self) -> &AuthorizedDepositor {
        &self.depositor
    }

    pub fn token(&self) -> &InMemoryToken {
        &self.token
    }

    fn call_context(&self) -> CallContext {
        CallContext::now(self.config.relayer, self.config.domain.chain_id)
    }
}

/// Body of `POST /permit-and-transfer-from`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermitAndTransferFromRequest {
    pub asset: Address,
    pub owner: Address,
    pub recipient: Address,
    pub value: U256,
    pub deadline: U256,
    pub v: u8,
    pub r: H256,
    pub s: H256,
}

/// Body of `POST /deposit-by-sig`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositBySigRequest {
    pub owner: Address,
    pub value: U256,
    pub deadline: U256,
    pub v: u8,
    pub r: H256,
    pub s: H256,
}

/// Successful execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptResponse {
    pub success: bool,
    pub receipt: TransferReceipt,
    /// Owner's nonce after the call
    pub nonce: U256,
}

/// Rejected call, carrying the failure kind and its human-readable reason
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub reason: String,
}

struct ApiError(PermitError);

impl From<PermitError> for ApiError {
    fn from(err: PermitError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_revert() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let body = ErrorResponse {
            success: false,
            error: self.0.kind().to_string(),
            reason: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Build the relayer router
pub fn create_router(state: RelayerState) -> Router {
    Router::new()
        .route("/permit-and-transfer-from", post(permit_and_transfer_from_handler))
        .route("/deposit-by-sig", post(deposit_by_sig_handler))
        .route("/nonces/{owner}", get(nonces_handler))
        .route("/balances/{account}", get(balance_handler))
        .route("/deposits/{owner}", get(deposit_handler))
        .route("/domain", get(domain_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(Mutex::new(state)))
}

async fn permit_and_transfer_from_handler(
    State(state): State<SharedState>,
    Json(request): Json<PermitAndTransferFromRequest>,
) -> std::result::Result<Json<ReceiptResponse>, ApiError> {
    let mut guard = state.lock().await;
    let state = &mut *guard;

    if request.asset != state.token.address() {
        return Err(PermitError::AssetMismatch {
            expected: state.token.address(),
            actual: request.asset,
        }
        .into());
    }

    let ctx = state.call_context();
    let signature = Signature::new(request.v, request.r, request.s);
    let receipt = state.depositor.permit_and_transfer_from(
        &ctx,
        &mut state.token,
        request.owner,
        request.recipient,
        request.value,
        request.deadline,
        &signature,
    )?;

    Ok(Json(ReceiptResponse {
        success: true,
        receipt,
        nonce: state.depositor.nonces(&request.owner),
    }))
}

async fn deposit_by_sig_handler(
    State(state): State<SharedState>,
    Json(request): Json<DepositBySigRequest>,
) -> std::result::Result<Json<ReceiptResponse>, ApiError> {
    let mut guard = state.lock().await;
    let state = &mut *guard;

    let ctx = state.call_context();
    let signature = Signature::new(request.v, request.r, request.s);
    let receipt = state.depositor.deposit_by_sig(
        &ctx,
        &mut state.token,
        request.owner,
        request.value,
        request.deadline,
        &signature,
    )?;

    Ok(Json(ReceiptResponse {
        success: true,
        receipt,
        nonce: state.depositor.nonces(&request.owner),
    }))
}

async fn nonces_handler(
    State(state): State<SharedState>,
    Path(owner): Path<Address>,
) -> Json<serde_json::Value> {
    let state = state.lock().await;
    Json(serde_json::json!({
        "owner": owner,
        "nonce": state.depositor.nonces(&owner),
    }))
}

async fn balance_handler(
    State(state): State<SharedState>,
    Path(account): Path<Address>,
) -> Json<serde_json::Value> {
    let state = state.lock().await;
    Json(serde_json::json!({
        "account": account,
        "balance": state.token.balance_of(&account),
    }))
}

async fn deposit_handler(
    State(state): State<SharedState>,
    Path(owner): Path<Address>,
) -> Json<serde_json::Value> {
    let state = state.lock().await;
    Json(serde_json::json!({
        "owner": owner,
        "deposit": state.depositor.deposit_of(&owner),
        "totalDeposits": state.depositor.total_deposits(),
    }))
}

async fn domain_handler(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let state = state.lock().await;
    Json(serde_json::json!({
        "domain": state.depositor.domain(),
        "separator": state.depositor.domain().separator(),
        "relayer": state.config.relayer,
        "asset": state.config.asset,
    }))
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": crate::VERSION,
    }))
}
