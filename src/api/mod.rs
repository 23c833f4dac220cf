//! REST API module
//!
//! HTTP surface of the node. Consumes the core strictly through its public
//! entry points: mempool push/snapshot, ledger reads and audited credits.
//!
//! # Endpoints
//!
//! - `GET /` - Liveness banner
//! - `GET /health`, `GET /healthz` - Health probes
//! - `GET /balance?addr=` - Account balance
//! - `GET /nonce?addr=` - Account replay nonce
//! - `POST /submitTx` - Validate and stage a transaction
//! - `GET /mempool` - Pending transactions
//! - `GET /blocks` - Block history
//! - `POST /addBalance`, `POST /api/resetBalance`, `POST /api/faucet` -
//!   Explicit, audited credit operations

pub mod faucet;
pub mod handlers;
pub mod routes;

pub use faucet::{FaucetLimiter, FAUCET_AMOUNT, FAUCET_INTERVAL};
pub use handlers::ApiState;
pub use routes::create_router;
