//! Ledger: authoritative block history and account state
//!
//! The ledger owns the chain of blocks and the balance/nonce table. Both
//! live under a single read-write lock and are only ever mutated together,
//! so no reader can observe a block appended without its state update.
//! Persistence is mirrored through a [`PersistenceGateway`] after the
//! in-memory commit, with no lock held across the call.

use crate::core::block::Block;
use crate::core::validation::AccountView;
use crate::storage::PersistenceGateway;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

/// Why a block was rejected by the ledger
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LedgerError {
    #[error("block linkage mismatch: {0}")]
    BlockLinkageMismatch(String),
    #[error("duplicate block number: {0}")]
    DuplicateBlockNumber(u64),
    #[error("nonce order violation for {address}: got {got}, expected > {current}")]
    NonceOrderViolation {
        address: String,
        got: u64,
        current: u64,
    },
    #[error("invalid proof of work")]
    InvalidProofOfWork,
    #[error("invalid block history: {0}")]
    InvalidHistory(String),
}

#[derive(Debug, Default, Clone)]
struct LedgerState {
    balances: HashMap<String, i64>,
    nonces: HashMap<String, u64>,
}

impl LedgerState {
    /// Apply one block's transfers in order. Callers have already checked
    /// nonce ordering where it matters; replay trusts committed history.
    fn apply_block(&mut self, block: &Block) {
        for tx in &block.transactions {
            *self.balances.entry(tx.from.clone()).or_insert(0) -= tx.amount;
            *self.balances.entry(tx.to.clone()).or_insert(0) += tx.amount;
            let nonce = self.nonces.entry(tx.from.clone()).or_insert(0);
            if tx.nonce > *nonce {
                *nonce = tx.nonce;
            }
        }
    }
}

#[derive(Debug, Default)]
struct LedgerInner {
    blocks: Vec<Block>,
    state: LedgerState,
    /// Explicit credits by address (genesis allocation, faucet, admin).
    /// The only source of value not backed by a debit; replays start here.
    credits: HashMap<String, i64>,
}

/// The single source of truth for block history and account state
pub struct Ledger {
    difficulty: u32,
    inner: RwLock<LedgerInner>,
    gateway: Arc<dyn PersistenceGateway>,
}

impl Ledger {
    /// Create a fresh ledger containing only the genesis block
    pub fn new(difficulty: u32, gateway: Arc<dyn PersistenceGateway>) -> Self {
        let genesis = Block::genesis();
        // Mirror genesis too, so a recovered history starts at block 0
        if let Err(err) = gateway.insert_block(&genesis) {
            log::warn!("failed to persist genesis block: {}", err);
        }
        let inner = LedgerInner {
            blocks: vec![genesis],
            state: LedgerState::default(),
            credits: HashMap::new(),
        };
        Self {
            difficulty,
            inner: RwLock::new(inner),
            gateway,
        }
    }

    /// Create a fresh ledger and seed the given genesis allocation
    pub fn with_genesis_alloc(
        difficulty: u32,
        gateway: Arc<dyn PersistenceGateway>,
        alloc: &[(String, i64)],
    ) -> Self {
        let ledger = Self::new(difficulty, gateway);
        for (address, amount) in alloc {
            ledger.add_balance(address, *amount);
        }
        ledger
    }

    /// Reconstruct a ledger from a persisted block history
    ///
    /// The history must start at genesis (number 0) and be in ascending
    /// order; state is recomputed by replay on top of the given allocation.
    pub fn from_blocks(
        difficulty: u32,
        gateway: Arc<dyn PersistenceGateway>,
        blocks: Vec<Block>,
        alloc: &[(String, i64)],
    ) -> Result<Self, LedgerError> {
        if blocks.is_empty() {
            return Ok(Self::with_genesis_alloc(difficulty, gateway, alloc));
        }
        if blocks[0].number != 0 {
            return Err(LedgerError::InvalidHistory(format!(
                "history starts at block {}, expected genesis",
                blocks[0].number
            )));
        }
        for pair in blocks.windows(2) {
            if pair[1].number != pair[0].number + 1 {
                return Err(LedgerError::InvalidHistory(format!(
                    "non-contiguous history: block {} follows {}",
                    pair[1].number, pair[0].number
                )));
            }
        }

        let ledger = Self {
            difficulty,
            inner: RwLock::new(LedgerInner {
                blocks,
                state: LedgerState::default(),
                credits: HashMap::new(),
            }),
            gateway,
        };
        for (address, amount) in alloc {
            ledger.add_balance(address, *amount);
        }
        ledger.rebuild_state_from_blocks();
        Ok(ledger)
    }

    /// Configured difficulty (leading hex zero digits of the proof hash)
    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    fn read(&self) -> RwLockReadGuard<'_, LedgerInner> {
        self.inner.read().expect("ledger lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, LedgerInner> {
        self.inner.write().expect("ledger lock poisoned")
    }

    /// The current chain tip
    pub fn latest_block(&self) -> Block {
        self.read()
            .blocks
            .last()
            .expect("chain always has genesis")
            .clone()
    }

    /// Number of blocks in the chain, genesis included
    pub fn block_count(&self) -> usize {
        self.read().blocks.len()
    }

    /// Copy of the full block history, ascending
    pub fn blocks(&self) -> Vec<Block> {
        self.read().blocks.clone()
    }

    /// Balance of an account; unknown addresses are zero
    pub fn get_balance(&self, address: &str) -> i64 {
        self.read().state.balances.get(address).copied().unwrap_or(0)
    }

    /// Recorded replay nonce of an account; unknown addresses are zero
    pub fn get_nonce(&self, address: &str) -> u64 {
        self.read().state.nonces.get(address).copied().unwrap_or(0)
    }

    /// Balance and nonce of one account, read under a single lock
    /// acquisition so validation never sees a torn view.
    pub fn account_view(&self, address: &str) -> AccountView {
        let inner = self.read();
        AccountView {
            balance: inner.state.balances.get(address).copied().unwrap_or(0),
            nonce: inner.state.nonces.get(address).copied().unwrap_or(0),
        }
    }

    /// Sum of all balances; transfers conserve it, credits move it
    pub fn total_supply(&self) -> i64 {
        self.read().state.balances.values().sum()
    }

    /// Validate and append a block, applying its transfers atomically
    ///
    /// All checks run before any mutation; on failure the ledger is
    /// untouched. On success the block and the updated state become
    /// visible together, and the block is then mirrored to persistence
    /// outside the lock (failures are logged, never rolled back).
    pub fn add_block(&self, block: Block) -> Result<(), LedgerError> {
        let touched: Vec<(String, i64)>;
        {
            let mut inner = self.write();
            let latest = inner.blocks.last().expect("chain always has genesis");

            if block.number <= latest.number {
                return Err(LedgerError::DuplicateBlockNumber(block.number));
            }
            if block.number != latest.number + 1 {
                return Err(LedgerError::BlockLinkageMismatch(format!(
                    "expected number {}, got {}",
                    latest.number + 1,
                    block.number
                )));
            }
            if block.prev_hash != latest.hash {
                return Err(LedgerError::BlockLinkageMismatch(format!(
                    "expected prev hash {}, got {}",
                    latest.hash, block.prev_hash
                )));
            }
            if !block.is_valid_pow(self.difficulty) {
                return Err(LedgerError::InvalidProofOfWork);
            }

            // Apply to a working copy so rejection leaves no partial state.
            // Transactions apply in block order, so several transfers from
            // one sender may share a block with strictly increasing nonces.
            let mut working = inner.state.clone();
            for tx in &block.transactions {
                let current = working.nonces.get(&tx.from).copied().unwrap_or(0);
                if tx.nonce <= current {
                    return Err(LedgerError::NonceOrderViolation {
                        address: tx.from.clone(),
                        got: tx.nonce,
                        current,
                    });
                }
                *working.balances.entry(tx.from.clone()).or_insert(0) -= tx.amount;
                *working.balances.entry(tx.to.clone()).or_insert(0) += tx.amount;
                working.nonces.insert(tx.from.clone(), tx.nonce);
            }

            touched = block
                .transactions
                .iter()
                .flat_map(|tx| [tx.from.clone(), tx.to.clone()])
                .map(|address| {
                    let balance = working.balances.get(&address).copied().unwrap_or(0);
                    (address, balance)
                })
                .collect();

            inner.blocks.push(block.clone());
            inner.state = working;
        }

        // Mirror outside the lock; in-memory state stays authoritative.
        if let Err(err) = self.gateway.insert_block(&block) {
            log::warn!("failed to persist block {}: {}", block.number, err);
        }
        for (address, balance) in touched {
            if let Err(err) = self.gateway.upsert_account_balance(&address, balance) {
                log::warn!("failed to persist balance of {}: {}", address, err);
            }
        }

        Ok(())
    }

    /// Recompute balances and nonces from scratch by replaying all blocks
    ///
    /// Deterministic: the same block sequence and credit table always
    /// yield the same state. Used at startup recovery and as a
    /// consistency-repair tool.
    pub fn rebuild_state_from_blocks(&self) {
        let mut inner = self.write();
        let mut state = LedgerState::default();
        for (address, amount) in &inner.credits {
            state.balances.insert(address.clone(), *amount);
        }
        for block in &inner.blocks {
            state.apply_block(block);
        }
        inner.state = state;
    }

    /// Credit an account out-of-band (faucet, demo seeding)
    ///
    /// Bypasses transaction validation; the only legitimate source of new
    /// value. Recorded in the credit table and on the `audit` log target.
    /// Returns the new balance.
    pub fn add_balance(&self, address: &str, amount: i64) -> i64 {
        let new_balance;
        {
            let mut inner = self.write();
            *inner.credits.entry(address.to_string()).or_insert(0) += amount;
            let balance = inner.state.balances.entry(address.to_string()).or_insert(0);
            *balance += amount;
            new_balance = *balance;
        }
        log::info!(target: "audit", "credit {} by {} -> {}", address, amount, new_balance);

        if let Err(err) = self.gateway.upsert_account_balance(address, new_balance) {
            log::warn!("failed to persist balance of {}: {}", address, err);
        }
        new_balance
    }

    /// Force an account balance to an absolute value (admin reset)
    ///
    /// The difference is recorded as an explicit credit (or debit) so
    /// audits and replays stay consistent. Returns the new balance.
    pub fn set_balance(&self, address: &str, amount: i64) -> i64 {
        let delta;
        {
            let mut inner = self.write();
            let balance = inner.state.balances.entry(address.to_string()).or_insert(0);
            delta = amount - *balance;
            *balance = amount;
            *inner.credits.entry(address.to_string()).or_insert(0) += delta;
        }
        log::info!(target: "audit", "set balance {} to {} (delta {})", address, amount, delta);

        if let Err(err) = self.gateway.upsert_account_balance(address, amount) {
            log::warn!("failed to persist balance of {}: {}", address, err);
        }
        amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transaction::Transaction;
    use crate::crypto::meets_difficulty;
    use crate::storage::MemoryGateway;

    const DIFFICULTY: u32 = 1;

    fn test_ledger() -> Ledger {
        Ledger::with_genesis_alloc(
            DIFFICULTY,
            Arc::new(MemoryGateway::new()),
            &[("alice".to_string(), 1000)],
        )
    }

    fn mined_block(ledger: &Ledger, transactions: Vec<Transaction>) -> Block {
        let tip = ledger.latest_block();
        let mut block = Block::candidate(tip.number + 1, tip.hash, 1_700_000_000, transactions);
        loop {
            block.nonce += 1;
            let hash = block.proof_hash();
            if meets_difficulty(&hash, DIFFICULTY) {
                block.hash = hash;
                return block;
            }
        }
    }

    #[test]
    fn test_fresh_ledger_has_genesis() {
        let ledger = test_ledger();
        assert_eq!(ledger.block_count(), 1);
        assert_eq!(ledger.latest_block().number, 0);
        assert_eq!(ledger.get_balance("alice"), 1000);
        assert_eq!(ledger.get_balance("unknown"), 0);
        assert_eq!(ledger.get_nonce("unknown"), 0);
    }

    #[test]
    fn test_add_block_applies_transfers() {
        let ledger = test_ledger();
        let block = mined_block(&ledger, vec![Transaction::new("alice", "bob", 100, 1)]);
        ledger.add_block(block).unwrap();

        assert_eq!(ledger.block_count(), 2);
        assert_eq!(ledger.get_balance("alice"), 900);
        assert_eq!(ledger.get_balance("bob"), 100);
        assert_eq!(ledger.get_nonce("alice"), 1);
    }

    #[test]
    fn test_conservation_across_blocks() {
        let ledger = test_ledger();
        let supply = ledger.total_supply();

        let block = mined_block(
            &ledger,
            vec![
                Transaction::new("alice", "bob", 100, 1),
                Transaction::new("alice", "carol", 50, 2),
            ],
        );
        ledger.add_block(block).unwrap();
        assert_eq!(ledger.total_supply(), supply);
    }

    #[test]
    fn test_same_sender_sequential_nonces_in_one_block() {
        let ledger = test_ledger();
        let block = mined_block(
            &ledger,
            vec![
                Transaction::new("alice", "bob", 100, 1),
                Transaction::new("alice", "bob", 100, 2),
            ],
        );
        ledger.add_block(block).unwrap();
        assert_eq!(ledger.get_balance("bob"), 200);
        assert_eq!(ledger.get_nonce("alice"), 2);
    }

    #[test]
    fn test_rejects_nonce_reuse_within_block() {
        let ledger = test_ledger();
        let block = mined_block(
            &ledger,
            vec![
                Transaction::new("alice", "bob", 100, 1),
                Transaction::new("alice", "bob", 100, 1),
            ],
        );
        let err = ledger.add_block(block).unwrap_err();
        assert!(matches!(err, LedgerError::NonceOrderViolation { .. }));

        // All-or-nothing: the first transfer must not have applied
        assert_eq!(ledger.get_balance("alice"), 1000);
        assert_eq!(ledger.get_balance("bob"), 0);
        assert_eq!(ledger.block_count(), 1);
    }

    #[test]
    fn test_rejects_stale_nonce() {
        let ledger = test_ledger();
        let first = mined_block(&ledger, vec![Transaction::new("alice", "bob", 100, 5)]);
        ledger.add_block(first).unwrap();

        let replay = mined_block(&ledger, vec![Transaction::new("alice", "bob", 100, 5)]);
        let err = ledger.add_block(replay).unwrap_err();
        assert!(matches!(err, LedgerError::NonceOrderViolation { .. }));
    }

    #[test]
    fn test_rejects_linkage_mismatch() {
        let ledger = test_ledger();
        let mut block = mined_block(&ledger, vec![Transaction::new("alice", "bob", 1, 1)]);
        block.number += 1;
        assert!(matches!(
            ledger.add_block(block),
            Err(LedgerError::BlockLinkageMismatch(_))
        ));
    }

    #[test]
    fn test_rejects_duplicate_block_number() {
        let ledger = test_ledger();
        let block = mined_block(&ledger, vec![Transaction::new("alice", "bob", 1, 1)]);
        ledger.add_block(block.clone()).unwrap();
        assert_eq!(
            ledger.add_block(block),
            Err(LedgerError::DuplicateBlockNumber(1))
        );
    }

    #[test]
    fn test_rejects_wrong_prev_hash() {
        let ledger = test_ledger();
        let mut block = mined_block(&ledger, vec![Transaction::new("alice", "bob", 1, 1)]);
        block.prev_hash = "deadbeef".to_string();
        assert!(matches!(
            ledger.add_block(block),
            Err(LedgerError::BlockLinkageMismatch(_))
        ));
    }

    #[test]
    fn test_rejects_insufficient_proof() {
        let ledger = Ledger::with_genesis_alloc(
            6,
            Arc::new(MemoryGateway::new()),
            &[("alice".to_string(), 1000)],
        );
        let tip = ledger.latest_block();
        let mut block = Block::candidate(
            1,
            tip.hash,
            1_700_000_000,
            vec![Transaction::new("alice", "bob", 1, 1)],
        );
        // Mine only to difficulty 1; six leading zeros will not be met
        loop {
            block.nonce += 1;
            let hash = block.proof_hash();
            if meets_difficulty(&hash, 1) && !meets_difficulty(&hash, 6) {
                block.hash = hash;
                break;
            }
        }
        assert_eq!(ledger.add_block(block), Err(LedgerError::InvalidProofOfWork));
    }

    #[test]
    fn test_replay_determinism() {
        let ledger = test_ledger();
        for nonce in 1..=3u64 {
            let block = mined_block(&ledger, vec![Transaction::new("alice", "bob", 10, nonce)]);
            ledger.add_block(block).unwrap();
        }

        let incremental = (
            ledger.get_balance("alice"),
            ledger.get_balance("bob"),
            ledger.get_nonce("alice"),
        );

        ledger.rebuild_state_from_blocks();
        let rebuilt = (
            ledger.get_balance("alice"),
            ledger.get_balance("bob"),
            ledger.get_nonce("alice"),
        );
        assert_eq!(incremental, rebuilt);
    }

    #[test]
    fn test_recovery_from_persisted_blocks() {
        let gateway = Arc::new(MemoryGateway::new());
        let ledger = Ledger::with_genesis_alloc(
            DIFFICULTY,
            gateway.clone(),
            &[("alice".to_string(), 1000)],
        );
        let block = mined_block(&ledger, vec![Transaction::new("alice", "bob", 250, 1)]);
        ledger.add_block(block).unwrap();

        let history = ledger.blocks();
        let recovered = Ledger::from_blocks(
            DIFFICULTY,
            gateway,
            history,
            &[("alice".to_string(), 1000)],
        )
        .unwrap();

        assert_eq!(recovered.block_count(), 2);
        assert_eq!(recovered.get_balance("alice"), 750);
        assert_eq!(recovered.get_balance("bob"), 250);
        assert_eq!(recovered.get_nonce("alice"), 1);
    }

    #[test]
    fn test_from_blocks_rejects_gaps() {
        let ledger = test_ledger();
        let block = mined_block(&ledger, vec![Transaction::new("alice", "bob", 1, 1)]);
        ledger.add_block(block).unwrap();

        let mut history = ledger.blocks();
        history.remove(1);
        history.insert(1, {
            let mut b = ledger.latest_block();
            b.number = 2;
            b
        });
        assert!(Ledger::from_blocks(
            DIFFICULTY,
            Arc::new(MemoryGateway::new()),
            history,
            &[]
        )
        .is_err());
    }

    #[test]
    fn test_explicit_credits_are_tracked() {
        let ledger = test_ledger();
        let supply = ledger.total_supply();

        let balance = ledger.add_balance("dave", 50);
        assert_eq!(balance, 50);
        assert_eq!(ledger.total_supply(), supply + 50);

        ledger.set_balance("dave", 0);
        assert_eq!(ledger.get_balance("dave"), 0);
        assert_eq!(ledger.total_supply(), supply);

        // Credits survive a replay
        ledger.add_balance("dave", 75);
        ledger.rebuild_state_from_blocks();
        assert_eq!(ledger.get_balance("dave"), 75);
    }

    #[test]
    fn test_nonce_monotonicity() {
        let ledger = test_ledger();
        let mut last = ledger.get_nonce("alice");
        for nonce in [2u64, 5, 9] {
            let block = mined_block(&ledger, vec![Transaction::new("alice", "bob", 10, nonce)]);
            ledger.add_block(block).unwrap();
            let current = ledger.get_nonce("alice");
            assert!(current >= last);
            last = current;
        }
        assert_eq!(last, 9);
    }
}
