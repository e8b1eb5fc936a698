//! Shared net secrets and key derivation
//!
//! Every net has exactly one 160-bit shared secret for its entire lifetime.
//! The secret itself never encrypts anything: members derive the actual
//! message key from it with a fixed hash, so every member independently
//! reconstructs the same key from the one distributed value.

use std::ops::Deref;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::envelope::MessageKey;
use super::hex::strip_0x;

/// Size of a net's shared secret in bytes (160 bits, address-shaped)
pub const SHARED_SECRET_SIZE: usize = 20;

/// Errors that can occur during shared-secret handling
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    /// The input is not exactly [`SHARED_SECRET_SIZE`] bytes
    #[error("invalid secret length, expected {SHARED_SECRET_SIZE}, got {0}")]
    InvalidLength(usize),
    #[error("secret hex decode error")]
    InvalidHex,
}

/// A net's 160-bit shared secret
///
/// The value is address-shaped: 20 raw bytes, hex-encoded for display. It is
/// distributed confidentially through the key gate and held only in client-local
/// caches, never on the public record.
///
/// # Examples
///
/// ```ignore
/// // The creator mints a fresh random secret per net
/// let secret = SharedSecret::generate();
///
/// // Every member derives the same message key from it
/// let key = secret.derive_key();
/// ```
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct SharedSecret([u8; SHARED_SECRET_SIZE]);

impl Deref for SharedSecret {
    type Target = [u8; SHARED_SECRET_SIZE];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<[u8; SHARED_SECRET_SIZE]> for SharedSecret {
    fn from(bytes: [u8; SHARED_SECRET_SIZE]) -> Self {
        SharedSecret(bytes)
    }
}

impl SharedSecret {
    /// Generate a new random shared secret using a cryptographically secure RNG
    pub fn generate() -> Self {
        let mut buff = [0; SHARED_SECRET_SIZE];
        getrandom::getrandom(&mut buff).expect("failed to generate random bytes");
        Self(buff)
    }

    /// Create a shared secret from a byte slice
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::InvalidLength`] if the slice is not exactly
    /// `SHARED_SECRET_SIZE` bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, SecretError> {
        if data.len() != SHARED_SECRET_SIZE {
            return Err(SecretError::InvalidLength(data.len()));
        }
        let mut buff = [0; SHARED_SECRET_SIZE];
        buff.copy_from_slice(data);
        Ok(buff.into())
    }

    /// Parse a shared secret from a hexadecimal string
    ///
    /// Accepts both plain hex and "0x"-prefixed hex strings.
    pub fn from_hex(hex: &str) -> Result<Self, SecretError> {
        let hex = strip_0x(hex);
        if hex.len() != SHARED_SECRET_SIZE * 2 {
            return Err(SecretError::InvalidLength(hex.len() / 2));
        }
        let mut buff = [0; SHARED_SECRET_SIZE];
        hex::decode_to_slice(hex, &mut buff).map_err(|_| SecretError::InvalidHex)?;
        Ok(buff.into())
    }

    /// Convert the shared secret to a "0x"-prefixed hexadecimal string
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Get a reference to the raw secret bytes
    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Derive the net's symmetric message key from this secret
    ///
    /// The derivation is a single SHA-256 over the 20 raw bytes, imported
    /// directly as an AES-256-GCM key. No salt, no context: determinism is the
    /// point. The same secret must yield the same key for every member, forever,
    /// or members would stop being able to read each other's messages.
    pub fn derive_key(&self) -> MessageKey {
        let digest = Sha256::digest(self.0);
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        MessageKey::from(key)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_secret_size_validation() {
        let too_short = [1u8; 16];
        let too_long = [1u8; 32];

        assert!(matches!(
            SharedSecret::from_slice(&too_short),
            Err(SecretError::InvalidLength(16))
        ));
        assert!(matches!(
            SharedSecret::from_slice(&too_long),
            Err(SecretError::InvalidLength(32))
        ));

        let just_right = [1u8; SHARED_SECRET_SIZE];
        assert!(SharedSecret::from_slice(&just_right).is_ok());
    }

    #[test]
    fn test_hex_roundtrip() {
        let secret = SharedSecret::generate();
        let hex = secret.to_hex();
        assert!(hex.starts_with("0x"));
        let recovered = SharedSecret::from_hex(&hex).unwrap();
        assert_eq!(secret, recovered);

        // unprefixed input is accepted too
        let recovered = SharedSecret::from_hex(hex.trim_start_matches("0x")).unwrap();
        assert_eq!(secret, recovered);
    }

    #[test]
    fn test_derive_is_deterministic() {
        let secret = SharedSecret::from_slice(&[0x11; SHARED_SECRET_SIZE]).unwrap();
        let key1 = secret.derive_key();
        let key2 = secret.derive_key();
        assert_eq!(key1, key2);

        // an independent copy of the same value derives the same key
        let copy = SharedSecret::from_hex(&secret.to_hex()).unwrap();
        assert_eq!(copy.derive_key(), key1);
    }

    #[test]
    fn test_different_secrets_derive_different_keys() {
        let a = SharedSecret::from_slice(&[0x11; SHARED_SECRET_SIZE]).unwrap();
        let b = SharedSecret::from_slice(&[0x22; SHARED_SECRET_SIZE]).unwrap();
        assert_ne!(a.derive_key(), b.derive_key());
    }
}
