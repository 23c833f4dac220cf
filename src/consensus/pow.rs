//! Proof-of-work block production
//!
//! A background task pulls pending transactions from the mempool, builds a
//! candidate block on the current tip and searches nonce space for a hash
//! with the required number of leading zero hex digits. The CPU-bound
//! search runs on a blocking thread and polls the stop signal at a bounded
//! iteration granularity, so ledger and mempool reads stay serviceable
//! while mining and shutdown latency stays bounded at any difficulty.

use crate::consensus::{ConsensusEngine, ConsensusError};
use crate::core::{Block, Ledger, Mempool, Transaction};
use crate::crypto::meets_difficulty;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// How many nonce attempts between checks of the stop signal
const CANCEL_POLL_INTERVAL: u64 = 4096;

/// Tuning knobs for the proof-of-work producer
#[derive(Debug, Clone)]
pub struct PowEngineConfig {
    /// Maximum transactions pulled into one candidate block
    pub batch_size: usize,
    /// Sleep between polls while the mempool is empty
    pub idle_backoff: Duration,
}

impl Default for PowEngineConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            idle_backoff: Duration::from_secs(1),
        }
    }
}

/// What one pass of the production loop did
enum RoundOutcome {
    /// A block was mined and committed
    Committed(u64),
    /// The candidate was rejected by the ledger; batch requeued
    Rejected,
    /// The stop signal interrupted the search; batch requeued
    Cancelled,
}

/// Proof-of-work consensus engine
pub struct PowEngine {
    ledger: Arc<Ledger>,
    mempool: Arc<Mempool>,
    config: PowEngineConfig,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PowEngine {
    pub fn new(ledger: Arc<Ledger>, mempool: Arc<Mempool>, config: PowEngineConfig) -> Self {
        Self {
            ledger,
            mempool,
            config,
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }

    /// Whether the production loop is currently running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Wait for the production loop to finish after [`ConsensusEngine::stop`]
    pub async fn join(&self) {
        let handle = self.handle.lock().expect("engine handle lock poisoned").take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                if !err.is_cancelled() {
                    log::error!("production loop task failed: {}", err);
                }
            }
        }
    }

    async fn production_loop(
        ledger: Arc<Ledger>,
        mempool: Arc<Mempool>,
        config: PowEngineConfig,
        running: Arc<AtomicBool>,
    ) {
        log::info!(
            "block producer started (difficulty {}, batch {})",
            ledger.difficulty(),
            config.batch_size
        );

        while running.load(Ordering::SeqCst) {
            match Self::mine_round(&ledger, &mempool, config.batch_size, &running).await {
                Err(ConsensusError::NoPendingWork) => {
                    tokio::time::sleep(config.idle_backoff).await;
                }
                Ok(RoundOutcome::Committed(number)) => {
                    log::info!("mined block {}", number);
                }
                Ok(RoundOutcome::Rejected) => {
                    log::warn!("candidate block rejected, retrying from new tip");
                }
                Ok(RoundOutcome::Cancelled) => {
                    log::debug!("proof search cancelled");
                }
            }
        }

        log::info!("block producer stopped");
    }

    /// Pull a batch, mine it and try to commit the result
    ///
    /// A batch that does not make it into a committed block is returned to
    /// the front of the mempool so no transaction is silently lost.
    async fn mine_round(
        ledger: &Arc<Ledger>,
        mempool: &Arc<Mempool>,
        batch_size: usize,
        running: &Arc<AtomicBool>,
    ) -> Result<RoundOutcome, ConsensusError> {
        if mempool.is_empty() {
            return Err(ConsensusError::NoPendingWork);
        }
        let mut transactions = mempool.pop_batch(batch_size);
        if transactions.is_empty() {
            return Err(ConsensusError::NoPendingWork);
        }

        let timestamp = chrono::Utc::now().timestamp();
        for tx in &mut transactions {
            if tx.timestamp == 0 {
                tx.timestamp = timestamp;
            }
        }

        let tip = ledger.latest_block();
        let candidate = Block::candidate(tip.number + 1, tip.hash, timestamp, transactions.clone());
        let difficulty = ledger.difficulty();

        let keep_going = running.clone();
        let search = tokio::task::spawn_blocking(move || {
            search_proof(candidate, difficulty, &keep_going)
        });

        let mined = match search.await {
            Ok(mined) => mined,
            Err(err) => {
                log::error!("proof search task failed: {}", err);
                mempool.requeue_front(transactions);
                return Ok(RoundOutcome::Cancelled);
            }
        };

        let Some(block) = mined else {
            mempool.requeue_front(transactions);
            return Ok(RoundOutcome::Cancelled);
        };

        // A solution found before the stop signal was observed is still
        // committed; only new search work stops.
        let number = block.number;
        let ids = block.transaction_ids();
        match ledger.add_block(block) {
            Ok(()) => {
                mempool.clear_mined(&ids);
                Ok(RoundOutcome::Committed(number))
            }
            Err(err) => {
                log::warn!("ledger rejected block {}: {}", number, err);
                mempool.requeue_front(transactions);
                Ok(RoundOutcome::Rejected)
            }
        }
    }
}

/// Search nonce space for a proof meeting the difficulty target
///
/// Returns `None` if the stop signal flips before a solution is found.
/// The signal is polled every [`CANCEL_POLL_INTERVAL`] attempts.
fn search_proof(mut block: Block, difficulty: u32, keep_going: &AtomicBool) -> Option<Block> {
    let digest = block.transactions_digest();
    let mut nonce = 0u64;
    loop {
        nonce += 1;
        if nonce % CANCEL_POLL_INTERVAL == 0 && !keep_going.load(Ordering::Relaxed) {
            return None;
        }
        block.nonce = nonce;
        let hash = block.proof_hash_with_digest(&digest);
        if meets_difficulty(&hash, difficulty) {
            block.hash = hash;
            return Some(block);
        }
    }
}

impl ConsensusEngine for PowEngine {
    fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let task = Self::production_loop(
            self.ledger.clone(),
            self.mempool.clone(),
            self.config.clone(),
            self.running.clone(),
        );
        let mut handle = self.handle.lock().expect("engine handle lock poisoned");
        *handle = Some(tokio::spawn(task));
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn propose_block(&self, transactions: Vec<Transaction>) -> Block {
        let tip = self.ledger.latest_block();
        Block::candidate(
            tip.number + 1,
            tip.hash,
            chrono::Utc::now().timestamp(),
            transactions,
        )
    }

    fn validate_block(&self, block: &Block) -> bool {
        block.is_valid_pow(self.ledger.difficulty())
    }
}
