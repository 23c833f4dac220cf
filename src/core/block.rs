//! Block type for the ledger
//!
//! A block links to its predecessor by hash and carries an ordered list of
//! transactions plus the proof-of-work nonce found by the producer.

use crate::core::transaction::Transaction;
use crate::crypto::{meets_difficulty, sha256_hex};
use serde::{Deserialize, Serialize};

/// A block in the chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Block height; genesis is 0
    pub number: u64,
    pub prev_hash: String,
    pub timestamp: i64,
    /// Proof-of-work nonce (distinct from the per-account replay nonce)
    pub nonce: u64,
    /// Hex-encoded proof hash, the solution found by the producer
    pub hash: String,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Create an unmined candidate block (nonce 0, hash empty)
    pub fn candidate(
        number: u64,
        prev_hash: String,
        timestamp: i64,
        transactions: Vec<Transaction>,
    ) -> Self {
        Self {
            number,
            prev_hash,
            timestamp,
            nonce: 0,
            hash: String::new(),
            transactions,
        }
    }

    /// Create the genesis block
    ///
    /// Genesis carries no transactions and no proof; its hash is still the
    /// proof-hash computation over its own fields so that block 1's
    /// `prev_hash` linkage is well defined.
    pub fn genesis() -> Self {
        let mut block = Self::candidate(0, String::new(), 0, Vec::new());
        block.hash = block.proof_hash();
        block
    }

    /// Digest of the transaction sequence
    ///
    /// SHA-256 over the concatenated transaction IDs in block order. Part
    /// of the proof input, so two blocks with identical headers but
    /// different transactions cannot share a proof.
    pub fn transactions_digest(&self) -> String {
        let mut preimage = String::new();
        for tx in &self.transactions {
            preimage.push_str(&tx.id());
        }
        sha256_hex(preimage.as_bytes())
    }

    /// Recompute the hex-encoded proof hash from this block's fields
    pub fn proof_hash(&self) -> String {
        self.proof_hash_with_digest(&self.transactions_digest())
    }

    /// Proof hash with a precomputed transactions digest
    ///
    /// The digest only depends on the transaction list, so the nonce
    /// search computes it once and reuses it per attempt.
    pub fn proof_hash_with_digest(&self, digest: &str) -> String {
        let preimage = format!(
            "{}{}{}{}{}",
            self.number, self.prev_hash, self.nonce, self.timestamp, digest
        );
        sha256_hex(preimage.as_bytes())
    }

    /// Check that the stored hash is the proof hash and meets the target
    pub fn is_valid_pow(&self, difficulty: u32) -> bool {
        let recomputed = self.proof_hash();
        recomputed == self.hash && meets_difficulty(&recomputed, difficulty)
    }

    /// IDs of all transactions in this block
    pub fn transaction_ids(&self) -> Vec<String> {
        self.transactions.iter().map(|tx| tx.id()).collect()
    }
}
