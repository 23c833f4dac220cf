//! nanochain: a single-node account-based proof-of-work ledger
//!
//! This crate provides the consensus and ledger engine of a minimal
//! blockchain node:
//! - Signed account-transfer transactions with per-sender replay nonces
//! - FIFO transaction mempool
//! - Ledger with authoritative balances derived by block replay
//! - Cancellable proof-of-work block producer
//! - Best-effort persistence mirror (JSON files or in-memory)
//! - REST API for submission and queries
//!
//! # Example
//!
//! ```rust
//! use nanochain::core::{Ledger, Mempool, Transaction};
//! use nanochain::storage::MemoryGateway;
//! use std::sync::Arc;
//!
//! // A fresh ledger with a seeded demo account
//! let gateway = Arc::new(MemoryGateway::new());
//! let ledger = Ledger::with_genesis_alloc(1, gateway, &[("alice".to_string(), 1_000)]);
//! assert_eq!(ledger.get_balance("alice"), 1_000);
//! assert_eq!(ledger.block_count(), 1);
//!
//! // Stage a transfer for the block producer
//! let mempool = Mempool::new();
//! mempool.push(Transaction::new("alice", "bob", 100, 1));
//! assert_eq!(mempool.len(), 1);
//! ```

pub mod api;
pub mod config;
pub mod consensus;
pub mod core;
pub mod crypto;
pub mod node;
pub mod storage;

// Re-export commonly used types
pub use api::{create_router, ApiState};
pub use config::NodeConfig;
pub use consensus::{ConsensusEngine, ConsensusError, PowEngine, PowEngineConfig};
pub use core::{
    validate_transaction, AccountView, Block, Ledger, LedgerError, Mempool, Transaction,
    ValidationError,
};
pub use crypto::KeyPair;
pub use node::Node;
pub use storage::{JsonStore, MemoryGateway, PersistenceGateway};
