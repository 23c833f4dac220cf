//! Transaction pool (mempool) for pending transactions
//!
//! Stages validated, unconfirmed transactions in submission order until the
//! consensus engine pulls them into a candidate block. Push is idempotent
//! by transaction ID; batch removal is tentative and can be undone with
//! [`Mempool::requeue_front`] when a mining round is abandoned.

use crate::core::transaction::Transaction;
use std::collections::{HashMap, VecDeque};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct MempoolInner {
    /// Transactions indexed by ID
    entries: HashMap<String, Transaction>,
    /// Transaction IDs in submission (FIFO) order
    order: VecDeque<String>,
}

/// Memory pool for pending transactions
///
/// All methods take `&self`; the pool carries its own lock so concurrent
/// producers can push while the engine drains and readers snapshot.
#[derive(Debug, Default)]
pub struct Mempool {
    inner: RwLock<MempoolInner>,
}

impl Mempool {
    /// Create a new, empty mempool
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, MempoolInner> {
        self.inner.read().expect("mempool lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, MempoolInner> {
        self.inner.write().expect("mempool lock poisoned")
    }

    /// Add a transaction to the pool
    ///
    /// Returns `true` if the transaction was inserted, `false` if an entry
    /// with the same ID was already pending (duplicate pushes are no-ops).
    pub fn push(&self, tx: Transaction) -> bool {
        let id = tx.id();
        let mut inner = self.write();
        if inner.entries.contains_key(&id) {
            return false;
        }
        inner.order.push_back(id.clone());
        inner.entries.insert(id, tx);
        true
    }

    /// Atomically remove and return up to `n` transactions in FIFO order
    ///
    /// Returns fewer than `n` if the pool holds fewer, and an empty vector
    /// if none are pending. The removal is tentative from the caller's
    /// perspective: an abandoned batch must be handed back via
    /// [`Mempool::requeue_front`].
    pub fn pop_batch(&self, n: usize) -> Vec<Transaction> {
        let mut inner = self.write();
        let count = n.min(inner.order.len());
        let mut batch = Vec::with_capacity(count);
        for _ in 0..count {
            let id = inner.order.pop_front().expect("order and entries in sync");
            if let Some(tx) = inner.entries.remove(&id) {
                batch.push(tx);
            }
        }
        batch
    }

    /// Return previously popped transactions to the front of the queue
    ///
    /// Relative order inside `txs` is preserved, and the batch as a whole
    /// goes ahead of everything pushed since, so an aborted mining round
    /// never loses or reorders work. Transactions whose ID re-entered the
    /// pool in the meantime are skipped.
    pub fn requeue_front(&self, txs: Vec<Transaction>) {
        let mut inner = self.write();
        for tx in txs.into_iter().rev() {
            let id = tx.id();
            if inner.entries.contains_key(&id) {
                continue;
            }
            inner.order.push_front(id.clone());
            inner.entries.insert(id, tx);
        }
    }

    /// Remove exactly the given transaction IDs, wherever they sit
    ///
    /// Used after a block containing them was committed. IDs not present
    /// are ignored.
    pub fn clear_mined(&self, ids: &[String]) {
        if ids.is_empty() {
            return;
        }
        let mut inner = self.write();
        let MempoolInner { entries, order } = &mut *inner;
        let mut removed = false;
        for id in ids {
            removed |= entries.remove(id).is_some();
        }
        if removed {
            order.retain(|id| entries.contains_key(id));
        }
    }

    /// Immutable point-in-time copy of the pending transactions, FIFO order
    pub fn snapshot(&self) -> Vec<Transaction> {
        let inner = self.read();
        inner
            .order
            .iter()
            .filter_map(|id| inner.entries.get(id).cloned())
            .collect()
    }

    /// Check if a transaction ID is pending
    pub fn contains(&self, id: &str) -> bool {
        self.read().entries.contains_key(id)
    }

    /// Number of pending transactions
    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    /// Check if the pool is empty
    pub fn is_empty(&self) -> bool {
        self.read().entries.is_empty()
    }

    /// Drop all pending transactions
    pub fn clear(&self) {
        let mut inner = self.write();
        inner.entries.clear();
        inner.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn tx(nonce: u64) -> Transaction {
        Transaction::new("alice", "bob", 10, nonce)
    }

    #[test]
    fn test_push_and_fifo_pop() {
        let pool = Mempool::new();
        assert!(pool.push(tx(1)));
        assert!(pool.push(tx(2)));
        assert!(pool.push(tx(3)));

        let batch = pool.pop_batch(2);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].nonce, 1);
        assert_eq!(batch[1].nonce, 2);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_duplicate_push_is_noop() {
        let pool = Mempool::new();
        assert!(pool.push(tx(1)));
        assert!(!pool.push(tx(1)));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_pop_batch_bounds() {
        let pool = Mempool::new();
        assert!(pool.pop_batch(5).is_empty());

        pool.push(tx(1));
        let batch = pool.pop_batch(5);
        assert_eq!(batch.len(), 1);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_requeue_front_preserves_order() {
        let pool = Mempool::new();
        pool.push(tx(1));
        pool.push(tx(2));

        let batch = pool.pop_batch(2);
        pool.push(tx(3));
        pool.requeue_front(batch);

        let all = pool.snapshot();
        let nonces: Vec<u64> = all.iter().map(|t| t.nonce).collect();
        assert_eq!(nonces, vec![1, 2, 3]);
    }

    #[test]
    fn test_clear_mined_by_id() {
        let pool = Mempool::new();
        pool.push(tx(1));
        pool.push(tx(2));
        pool.push(tx(3));

        let ids = vec![tx(1).id(), tx(3).id(), "missing".to_string()];
        pool.clear_mined(&ids);

        let rest = pool.snapshot();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].nonce, 2);
    }

    #[test]
    fn test_snapshot_is_point_in_time() {
        let pool = Mempool::new();
        pool.push(tx(1));
        let snap = pool.snapshot();
        pool.push(tx(2));
        assert_eq!(snap.len(), 1);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_concurrent_push_safety() {
        let pool = Arc::new(Mempool::new());
        let mut handles = Vec::new();

        for i in 0..8u64 {
            let pool = pool.clone();
            handles.push(thread::spawn(move || {
                for j in 0..50u64 {
                    pool.push(Transaction::new("alice", "bob", 1, i * 50 + j));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        // 8 threads x 50 distinct nonces = 400 distinct IDs
        assert_eq!(pool.len(), 400);
    }
}
