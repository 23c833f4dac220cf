//! Persistence gateway consumed by the ledger
//!
//! The ledger mirrors committed blocks and account balances through this
//! trait. Persistence is best-effort: the in-memory ledger stays
//! authoritative and keeps advancing when a gateway call fails.

use crate::core::Block;
use std::collections::HashMap;
use std::io;
use std::sync::Mutex;
use thiserror::Error;

/// Storage errors; non-fatal to consensus progress
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Durable mirror of ledger history and account balances
pub trait PersistenceGateway: Send + Sync {
    /// Record a committed block exactly once
    ///
    /// Re-delivery of an already-recorded block number must not duplicate
    /// effects.
    fn insert_block(&self, block: &Block) -> Result<(), PersistenceError>;

    /// All previously persisted blocks in ascending order
    fn load_chain(&self) -> Result<Vec<Block>, PersistenceError>;

    /// Mirror an account's current balance for external query
    ///
    /// A read-model, not authoritative state.
    fn upsert_account_balance(&self, address: &str, balance: i64) -> Result<(), PersistenceError>;
}

#[derive(Debug, Default)]
struct MemoryStore {
    blocks: Vec<Block>,
    balances: HashMap<String, i64>,
}

/// In-memory gateway used by tests and ephemeral nodes
#[derive(Debug, Default)]
pub struct MemoryGateway {
    store: Mutex<MemoryStore>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirrored balance of an account, if any
    pub fn balance_of(&self, address: &str) -> Option<i64> {
        self.store
            .lock()
            .expect("memory gateway lock poisoned")
            .balances
            .get(address)
            .copied()
    }

    /// Number of persisted blocks
    pub fn block_count(&self) -> usize {
        self.store
            .lock()
            .expect("memory gateway lock poisoned")
            .blocks
            .len()
    }
}

impl PersistenceGateway for MemoryGateway {
    fn insert_block(&self, block: &Block) -> Result<(), PersistenceError> {
        let mut store = self.store.lock().expect("memory gateway lock poisoned");
        if store.blocks.iter().any(|b| b.number == block.number) {
            return Ok(());
        }
        store.blocks.push(block.clone());
        store.blocks.sort_by_key(|b| b.number);
        Ok(())
    }

    fn load_chain(&self) -> Result<Vec<Block>, PersistenceError> {
        Ok(self
            .store
            .lock()
            .expect("memory gateway lock poisoned")
            .blocks
            .clone())
    }

    fn upsert_account_balance(&self, address: &str, balance: i64) -> Result<(), PersistenceError> {
        self.store
            .lock()
            .expect("memory gateway lock poisoned")
            .balances
            .insert(address.to_string(), balance);
        Ok(())
    }
}
