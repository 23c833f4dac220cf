//! Core ledger components
//!
//! This module contains the fundamental building blocks:
//! - Transactions (signed account transfers with replay nonces)
//! - Blocks (proof-of-work linked history)
//! - Mempool (FIFO staging for unconfirmed transactions)
//! - Ledger (block history + authoritative account state)
//! - Validation (submission rules against a consistent snapshot)

pub mod block;
pub mod ledger;
pub mod mempool;
pub mod transaction;
pub mod validation;

pub use block::Block;
pub use ledger::{Ledger, LedgerError};
pub use mempool::Mempool;
pub use transaction::Transaction;
pub use validation::{validate_transaction, AccountView, ValidationError};
