//! ECDSA key management for the ledger
//!
//! Provides key pair generation and recoverable signatures using the
//! secp256k1 elliptic curve. Addresses are derived Ethereum-style: the
//! last 20 bytes of the Keccak-256 of the uncompressed public key.

use rand::rngs::OsRng;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use thiserror::Error;

use super::hash::keccak256;

/// Length of a recoverable signature: 64 compact bytes plus the recovery id
pub const SIGNATURE_LEN: usize = 65;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid signature encoding")]
    InvalidSignature,
    #[error("Signature recovery failed")]
    RecoveryFailed,
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// A key pair consisting of a private key and its corresponding public key
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from a hex-encoded private key
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(strip_hex_prefix(hex_key)).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key = SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Get the private key as a hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Get the public key as a hex string (compressed format)
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    /// Get the account address for this key pair
    pub fn address(&self) -> String {
        public_key_to_address(&self.public_key)
    }

    /// Sign a 32-byte digest, returning a hex-encoded recoverable signature
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<String, KeyError> {
        let secp = Secp256k1::new();
        let message = Message::from_digest_slice(digest)?;
        let signature = secp.sign_ecdsa_recoverable(&message, &self.secret_key);
        let (recovery_id, compact) = signature.serialize_compact();

        let mut bytes = [0u8; SIGNATURE_LEN];
        bytes[..64].copy_from_slice(&compact);
        bytes[64] = recovery_id.to_i32() as u8;
        Ok(hex::encode(bytes))
    }
}

/// Convert a public key to an account address
///
/// Address = "0x" + hex of the last 20 bytes of Keccak-256 over the
/// uncompressed public key (without the 0x04 tag byte).
pub fn public_key_to_address(public_key: &PublicKey) -> String {
    let uncompressed = public_key.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);
    format!("0x{}", hex::encode(&hash[12..]))
}

/// Recover the signer address from a digest and a hex-encoded signature
///
/// Accepts an optional "0x" prefix and both 0/1 and 27/28 recovery ids.
pub fn recover_address(digest: &[u8; 32], signature_hex: &str) -> Result<String, KeyError> {
    let bytes =
        hex::decode(strip_hex_prefix(signature_hex)).map_err(|_| KeyError::InvalidSignature)?;
    if bytes.len() != SIGNATURE_LEN {
        return Err(KeyError::InvalidSignature);
    }

    let mut v = bytes[64] as i32;
    if v >= 27 {
        v -= 27;
    }
    let recovery_id = RecoveryId::from_i32(v).map_err(|_| KeyError::InvalidSignature)?;
    let signature = RecoverableSignature::from_compact(&bytes[..64], recovery_id)
        .map_err(|_| KeyError::InvalidSignature)?;

    let secp = Secp256k1::new();
    let message = Message::from_digest_slice(digest)?;
    let public_key = secp
        .recover_ecdsa(&message, &signature)
        .map_err(|_| KeyError::RecoveryFailed)?;

    Ok(public_key_to_address(&public_key))
}

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x").unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_pair_generation() {
        let kp = KeyPair::generate();
        assert!(!kp.private_key_hex().is_empty());
        assert!(!kp.public_key_hex().is_empty());
        assert!(kp.address().starts_with("0x"));
        assert_eq!(kp.address().len(), 42);
    }

    #[test]
    fn test_key_pair_from_hex() {
        let kp1 = KeyPair::generate();
        let private_hex = kp1.private_key_hex();

        let kp2 = KeyPair::from_private_key_hex(&private_hex).unwrap();
        assert_eq!(kp1.public_key_hex(), kp2.public_key_hex());
        assert_eq!(kp1.address(), kp2.address());
    }

    #[test]
    fn test_sign_and_recover() {
        let kp = KeyPair::generate();
        let digest = keccak256(b"hello ledger");

        let signature = kp.sign_digest(&digest).unwrap();
        let recovered = recover_address(&digest, &signature).unwrap();
        assert_eq!(recovered, kp.address());
    }

    #[test]
    fn test_recover_accepts_0x_prefix_and_eth_v() {
        let kp = KeyPair::generate();
        let digest = keccak256(b"prefix test");
        let signature = kp.sign_digest(&digest).unwrap();

        let prefixed = format!("0x{}", signature);
        assert_eq!(recover_address(&digest, &prefixed).unwrap(), kp.address());

        // Shift v to the 27/28 convention used by Ethereum tooling
        let mut bytes = hex::decode(&signature).unwrap();
        bytes[64] += 27;
        let shifted = hex::encode(bytes);
        assert_eq!(recover_address(&digest, &shifted).unwrap(), kp.address());
    }

    #[test]
    fn test_recover_rejects_garbage() {
        let digest = keccak256(b"garbage");
        assert!(recover_address(&digest, "not-hex").is_err());
        assert!(recover_address(&digest, &"ab".repeat(10)).is_err());
    }
}
