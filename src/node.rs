//! Node assembly
//!
//! Wires the ledger, mempool and consensus engine together, recovering
//! persisted history at startup.

use crate::config::NodeConfig;
use crate::consensus::{ConsensusEngine, PowEngine, PowEngineConfig};
use crate::core::{Ledger, LedgerError, Mempool};
use crate::storage::{PersistenceError, PersistenceGateway};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can abort node startup
#[derive(Error, Debug)]
pub enum NodeError {
    #[error("failed to load persisted chain: {0}")]
    LoadFailed(#[from] PersistenceError),
    #[error("persisted chain is unusable: {0}")]
    BadHistory(#[from] LedgerError),
}

/// A fully wired ledger node
pub struct Node {
    pub config: NodeConfig,
    pub ledger: Arc<Ledger>,
    pub mempool: Arc<Mempool>,
    pub engine: Arc<PowEngine>,
}

impl Node {
    /// Create a node, recovering any persisted block history
    ///
    /// A non-empty history is replayed from genesis to rebuild balances
    /// and nonces; an empty one starts a fresh chain with the configured
    /// genesis allocation.
    pub fn new(config: NodeConfig, gateway: Arc<dyn PersistenceGateway>) -> Result<Self, NodeError> {
        let persisted = gateway.load_chain()?;

        let ledger = if persisted.is_empty() {
            log::info!("no persisted chain found, starting from genesis");
            Ledger::with_genesis_alloc(config.difficulty, gateway, &config.genesis_alloc)
        } else {
            log::info!("recovered {} block(s) from persistence", persisted.len());
            Ledger::from_blocks(config.difficulty, gateway, persisted, &config.genesis_alloc)?
        };

        let ledger = Arc::new(ledger);
        let mempool = Arc::new(Mempool::new());
        let engine = Arc::new(PowEngine::new(
            ledger.clone(),
            mempool.clone(),
            PowEngineConfig {
                batch_size: config.batch_size,
                idle_backoff: config.idle_backoff,
            },
        ));

        Ok(Self {
            config,
            ledger,
            mempool,
            engine,
        })
    }

    /// Start the block producer
    pub fn start(&self) {
        self.engine.start();
    }

    /// Stop the block producer and wait for it to wind down
    pub async fn shutdown(&self) {
        self.engine.stop();
        self.engine.join().await;
    }
}
