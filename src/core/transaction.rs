//! Transaction type for the ledger
//!
//! A transaction is a signed transfer of value between two accounts,
//! carrying a per-sender nonce for replay protection.

use crate::crypto::{keccak256, sha256_hex, KeyError, KeyPair};
use serde::{Deserialize, Serialize};

/// A signed account-transfer transaction
///
/// The wire representation uses exactly these field names. `signature` is a
/// hex-encoded 65-byte recoverable secp256k1 signature over the Keccak-256
/// digest of [`Transaction::signing_message`]. `timestamp` is optional on
/// submission and is stamped by the block producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub from: String,
    pub to: String,
    pub amount: i64,
    pub nonce: u64,
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub timestamp: i64,
}

impl Transaction {
    /// Create a new unsigned transaction
    pub fn new(from: &str, to: &str, amount: i64, nonce: u64) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            amount,
            nonce,
            signature: String::new(),
            timestamp: 0,
        }
    }

    /// Deterministic transaction ID
    ///
    /// SHA-256 over from, to, amount, nonce and signature. The timestamp is
    /// excluded: the producer stamps it after the transaction leaves the
    /// mempool, and the ID must stay stable so the mined entry can still be
    /// cleared by ID.
    pub fn id(&self) -> String {
        let preimage = format!(
            "{}{}{}{}{}",
            self.from, self.to, self.amount, self.nonce, self.signature
        );
        sha256_hex(preimage.as_bytes())
    }

    /// The canonical message a sender signs
    ///
    /// Field order and the absence of whitespace are part of the wire
    /// contract; clients build the identical string.
    pub fn signing_message(&self) -> String {
        format!(
            r#"{{"from":"{}","to":"{}","amount":{},"nonce":{}}}"#,
            self.from, self.to, self.amount, self.nonce
        )
    }

    /// Keccak-256 digest of the canonical signing message
    pub fn signing_digest(&self) -> [u8; 32] {
        keccak256(self.signing_message().as_bytes())
    }

    /// Sign this transaction with the given key pair
    pub fn sign(&mut self, key_pair: &KeyPair) -> Result<(), KeyError> {
        self.signature = key_pair.sign_digest(&self.signing_digest())?;
        Ok(())
    }
}
