//! Cryptographic utilities for the ledger
//!
//! This module provides:
//! - SHA-256 and Keccak-256 hashing
//! - ECDSA key management with recoverable signatures (secp256k1)

pub mod hash;
pub mod keys;

pub use hash::{keccak256, meets_difficulty, sha256, sha256_hex};
pub use keys::{public_key_to_address, recover_address, KeyError, KeyPair, SIGNATURE_LEN};
