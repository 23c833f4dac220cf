//! Cryptographic hashing utilities for the ledger
//!
//! Provides the SHA-256 hashing used for transaction IDs and block proof
//! hashes, plus Keccak-256 for signature recovery and addresses.

use sha2::{Digest, Sha256};
use sha3::Keccak256;

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Computes SHA-256 hash and returns it as a hex string
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Computes Keccak-256 hash of the input data
///
/// Used for the transaction signing digest and for deriving addresses
/// from recovered public keys.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Checks if a hex-encoded hash meets the difficulty target
///
/// Difficulty is the required count of leading zero hexadecimal digits.
pub fn meets_difficulty(hash_hex: &str, difficulty: u32) -> bool {
    let required = difficulty as usize;
    if required > hash_hex.len() {
        return false;
    }
    hash_hex.bytes().take(required).all(|b| b == b'0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256() {
        let data = b"hello world";
        let hash = sha256(data);
        assert_eq!(hash.len(), 32);
        assert_eq!(
            sha256_hex(data),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_keccak256() {
        // Known vector: keccak256 of the empty string
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_meets_difficulty() {
        assert!(meets_difficulty("000abc", 3));
        assert!(meets_difficulty("000abc", 2));
        assert!(!meets_difficulty("000abc", 4));
        assert!(meets_difficulty("ffff", 0));
        assert!(!meets_difficulty("00", 3));
    }
}
