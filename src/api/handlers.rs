//! REST API handlers for ledger operations

use crate::api::faucet::{FaucetLimiter, FAUCET_AMOUNT};
use crate::core::{validate_transaction, Block, Ledger, Mempool, Transaction};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared application state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub ledger: Arc<Ledger>,
    pub mempool: Arc<Mempool>,
    pub faucet: Arc<FaucetLimiter>,
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct BalanceResponse {
    pub address: String,
    pub balance: i64,
}

#[derive(Serialize)]
pub struct NonceResponse {
    pub address: String,
    pub nonce: u64,
}

#[derive(Serialize)]
pub struct SubmitResponse {
    pub status: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditResponse {
    pub success: bool,
    pub new_balance: i64,
}

#[derive(Serialize)]
pub struct FaucetResponse {
    pub address: String,
    pub amount: i64,
    pub balance: i64,
    pub status: String,
}

#[derive(Serialize)]
pub struct ApiError {
    pub error: String,
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct AddressQuery {
    pub addr: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddBalanceRequest {
    pub user_id: String,
    pub amount: i64,
}

#[derive(Deserialize)]
pub struct AddressRequest {
    pub address: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET / - Liveness banner
pub async fn root() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
        message: "RPC server is alive and speaking JSON".to_string(),
    })
}

/// GET /health and /healthz - Health probes
pub async fn health_check() -> &'static str {
    "ok"
}

/// GET /balance?addr= - Account balance
pub async fn get_balance(
    State(state): State<ApiState>,
    Query(query): Query<AddressQuery>,
) -> Json<BalanceResponse> {
    Json(BalanceResponse {
        balance: state.ledger.get_balance(&query.addr),
        address: query.addr,
    })
}

/// GET /nonce?addr= - Account replay nonce
pub async fn get_nonce(
    State(state): State<ApiState>,
    Query(query): Query<AddressQuery>,
) -> Json<NonceResponse> {
    Json(NonceResponse {
        nonce: state.ledger.get_nonce(&query.addr),
        address: query.addr,
    })
}

/// POST /submitTx - Validate a transaction and stage it for mining
pub async fn submit_tx(
    State(state): State<ApiState>,
    Json(tx): Json<Transaction>,
) -> Result<Json<SubmitResponse>, (StatusCode, Json<ApiError>)> {
    // Balance and nonce come from one snapshot so a concurrent commit
    // cannot slip between the reads.
    let sender = state.ledger.account_view(&tx.from);
    if let Err(err) = validate_transaction(&tx, &sender) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError {
                error: err.to_string(),
            }),
        ));
    }

    state.mempool.push(tx);
    Ok(Json(SubmitResponse {
        status: "accepted".to_string(),
    }))
}

/// GET /mempool - Pending transactions, submission order
pub async fn get_mempool(State(state): State<ApiState>) -> Json<Vec<Transaction>> {
    Json(state.mempool.snapshot())
}

/// GET /blocks - Full block history
pub async fn get_blocks(State(state): State<ApiState>) -> Json<Vec<Block>> {
    Json(state.ledger.blocks())
}

/// POST /addBalance - Explicit credit (demo/admin)
pub async fn add_balance(
    State(state): State<ApiState>,
    Json(request): Json<AddBalanceRequest>,
) -> Result<Json<CreditResponse>, (StatusCode, Json<ApiError>)> {
    if request.user_id.is_empty() || request.amount <= 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError {
                error: "invalid body".to_string(),
            }),
        ));
    }

    let new_balance = state.ledger.add_balance(&request.user_id, request.amount);
    Ok(Json(CreditResponse {
        success: true,
        new_balance,
    }))
}

/// POST /api/resetBalance - Zero an account (demo/admin)
pub async fn reset_balance(
    State(state): State<ApiState>,
    Json(request): Json<AddressRequest>,
) -> Result<Json<CreditResponse>, (StatusCode, Json<ApiError>)> {
    if request.address.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError {
                error: "invalid body".to_string(),
            }),
        ));
    }

    let new_balance = state.ledger.set_balance(&request.address, 0);
    Ok(Json(CreditResponse {
        success: true,
        new_balance,
    }))
}

/// POST /api/faucet - Rate-limited demo credit
pub async fn faucet(
    State(state): State<ApiState>,
    Json(request): Json<AddressRequest>,
) -> Result<Json<FaucetResponse>, (StatusCode, Json<ApiError>)> {
    if request.address.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError {
                error: "Address is required".to_string(),
            }),
        ));
    }

    if !state.faucet.try_acquire(&request.address) {
        return Err((
            StatusCode::TOO_MANY_REQUESTS,
            Json(ApiError {
                error: "Please wait 1 minute between faucet requests".to_string(),
            }),
        ));
    }

    let balance = state.ledger.add_balance(&request.address, FAUCET_AMOUNT);
    Ok(Json(FaucetResponse {
        address: request.address,
        amount: FAUCET_AMOUNT,
        balance,
        status: "ok".to_string(),
    }))
}
