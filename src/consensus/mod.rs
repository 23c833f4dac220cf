//! Consensus engines for block production and validation
//!
//! The [`ConsensusEngine`] trait is the capability set a node needs from
//! its consensus backend; [`PowEngine`] is the proof-of-work variant.
//! Other backends (stake-based, BFT) would implement the same trait and be
//! selected at construction time.

pub mod pow;

use crate::core::{Block, Transaction};
use thiserror::Error;

/// Consensus-level conditions
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConsensusError {
    /// Not a failure: the mempool is empty and the producer should back off
    #[error("no pending work")]
    NoPendingWork,
}

/// Capability set of a consensus backend
pub trait ConsensusEngine: Send + Sync {
    /// Launch the background production loop; non-blocking and idempotent
    fn start(&self);

    /// Signal the production loop to terminate
    ///
    /// Observed within a bounded number of proof-search iterations, so
    /// shutdown latency is bounded regardless of difficulty.
    fn stop(&self);

    /// Construct a well-formed, unmined candidate block from the chain tip
    ///
    /// Does not search for a proof and does not mutate the ledger.
    fn propose_block(&self, transactions: Vec<Transaction>) -> Block;

    /// Check a block's proof against the required difficulty
    ///
    /// Recomputes the proof hash from the block's fields (including the
    /// transaction digest); the identical check gates mining.
    fn validate_block(&self, block: &Block) -> bool;
}

pub use pow::{PowEngine, PowEngineConfig};
