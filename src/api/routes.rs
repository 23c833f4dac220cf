//! REST API routes configuration

use crate::api::handlers::{self, ApiState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

/// Create the API router with all routes
pub fn create_router(state: ApiState) -> Router {
    // Permissive CORS so browser dashboards can talk to the node
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/healthz", get(handlers::health_check))
        // Accounts
        .route("/balance", get(handlers::get_balance))
        .route("/nonce", get(handlers::get_nonce))
        // Transactions
        .route("/submitTx", post(handlers::submit_tx))
        .route("/mempool", get(handlers::get_mempool))
        // Chain
        .route("/blocks", get(handlers::get_blocks))
        // Credits (demo/admin)
        .route("/addBalance", post(handlers::add_balance))
        .route("/api/resetBalance", post(handlers::reset_balance))
        .route("/api/faucet", post(handlers::faucet))
        .with_state(state)
        .layer(cors)
}
