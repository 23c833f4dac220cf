//! Transaction validation rules
//!
//! Stateless rule-checking for submitted transactions. Runs against a
//! consistent per-account snapshot taken from the ledger so a concurrent
//! block commit cannot change the balance mid-check.

use crate::core::transaction::Transaction;
use crate::crypto::recover_address;
use thiserror::Error;

/// Why a submitted transaction was rejected
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("amount must be positive")]
    InvalidAmount,
    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: i64, need: i64 },
    #[error("invalid nonce: got {got}, expected > {current}")]
    StaleOrReusedNonce { got: u64, current: u64 },
    #[error("missing signature")]
    MissingSignature,
    #[error("invalid signature")]
    InvalidSignature,
}

/// Consistent view of one account, read under a single ledger lock
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountView {
    pub balance: i64,
    pub nonce: u64,
}

/// Validate a transaction against the sender's account snapshot
///
/// Checks run in order and short-circuit on the first failure:
/// positive amount, covered balance, strictly increasing nonce, presence
/// of a signature, and signer recovery matching `from` (case-insensitive).
/// The nonce only has to be larger than the recorded one, not the next
/// value; gaps are tolerated.
pub fn validate_transaction(tx: &Transaction, sender: &AccountView) -> Result<(), ValidationError> {
    if tx.amount <= 0 {
        return Err(ValidationError::InvalidAmount);
    }

    if sender.balance < tx.amount {
        return Err(ValidationError::InsufficientBalance {
            have: sender.balance,
            need: tx.amount,
        });
    }

    if tx.nonce <= sender.nonce {
        return Err(ValidationError::StaleOrReusedNonce {
            got: tx.nonce,
            current: sender.nonce,
        });
    }

    if tx.signature.is_empty() {
        return Err(ValidationError::MissingSignature);
    }

    let recovered = recover_address(&tx.signing_digest(), &tx.signature)
        .map_err(|_| ValidationError::InvalidSignature)?;
    if !recovered.eq_ignore_ascii_case(&tx.from) {
        return Err(ValidationError::InvalidSignature);
    }

    Ok(())
}
