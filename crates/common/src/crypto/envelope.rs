//! Message envelope encryption using AES-256-GCM
//!
//! This module provides the authenticated message codec. Every payload on a
//! net's log is a self-contained envelope: `nonce (12 bytes) || ciphertext ||
//! auth_tag (16 bytes)`, hex-encoded for transport. The format carries no
//! padding, no compression, and no metadata beyond nonce and tag, so payload
//! length is observable to anyone reading the public record.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use serde::{Deserialize, Serialize};

use super::hex::{bytes_to_hex, hex_to_bytes};

/// Size of AES-GCM nonce in bytes
pub const NONCE_SIZE: usize = 12;
/// Size of AES-GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;
/// Size of the derived message key in bytes (256 bits)
pub const MESSAGE_KEY_SIZE: usize = 32;
/// Smallest decoded envelope that is structurally valid
///
/// Anything shorter cannot even hold a nonce plus one ciphertext byte and is
/// rejected before the cipher runs. Well-formed envelopes are in fact at least
/// `NONCE_SIZE + TAG_SIZE` bytes; values in between fail tag verification.
pub const MIN_ENVELOPE_SIZE: usize = NONCE_SIZE + 1;

/// Errors that can occur during envelope encryption/decryption
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    /// Encryption failed (should be rare, only on system RNG failure)
    #[error("encrypt error: {0}")]
    EncryptionFailed(String),
    /// The envelope could not be decrypted
    ///
    /// Deliberately carries no detail: a wrong key, a corrupted envelope,
    /// malformed hex, and a truncated envelope are indistinguishable, and the
    /// failure is non-retryable for that envelope.
    #[error("decrypt error")]
    DecryptionFailed,
}

/// A symmetric message key derived from a net's shared secret
///
/// See [`SharedSecret::derive_key`](super::SharedSecret::derive_key) for how
/// members obtain it. The key encrypts and decrypts message envelopes with
/// AES-256-GCM.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct MessageKey([u8; MESSAGE_KEY_SIZE]);

impl From<[u8; MESSAGE_KEY_SIZE]> for MessageKey {
    fn from(bytes: [u8; MESSAGE_KEY_SIZE]) -> Self {
        MessageKey(bytes)
    }
}

impl MessageKey {
    /// Encrypt a text message into a fresh envelope
    ///
    /// Generates a random 96-bit nonce for each call; nonces are never reused
    /// under the same key at any plausible message volume. The output is
    /// `nonce || ciphertext_with_tag`.
    ///
    /// # Errors
    ///
    /// Returns an error if nonce generation or the cipher itself fails.
    pub fn encrypt(&self, plaintext: &str) -> Result<Envelope, CipherError> {
        let key = Key::<Aes256Gcm>::from_slice(&self.0);
        let cipher = Aes256Gcm::new(key);

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        getrandom::getrandom(&mut nonce_bytes)
            .map_err(|e| CipherError::EncryptionFailed(format!("failed to generate nonce: {}", e)))?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::EncryptionFailed("aead failure".to_string()))?;

        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(nonce.as_ref());
        out.extend_from_slice(ciphertext.as_ref());

        Ok(Envelope(out))
    }

    /// Decrypt an envelope back into its text message
    ///
    /// Splits the first 12 bytes as nonce and runs authenticated decryption
    /// over the remainder.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::DecryptionFailed`] if the envelope is shorter
    /// than [`MIN_ENVELOPE_SIZE`], the authentication tag does not verify, or
    /// the plaintext is not valid UTF-8. Callers cannot tell which.
    pub fn decrypt(&self, envelope: &Envelope) -> Result<String, CipherError> {
        let data = envelope.as_bytes();
        if data.len() < MIN_ENVELOPE_SIZE {
            return Err(CipherError::DecryptionFailed);
        }

        let key = Key::<Aes256Gcm>::from_slice(&self.0);
        let nonce = Nonce::from_slice(&data[..NONCE_SIZE]);
        let cipher = Aes256Gcm::new(key);
        let decrypted = cipher
            .decrypt(nonce, &data[NONCE_SIZE..])
            .map_err(|_| CipherError::DecryptionFailed)?;

        String::from_utf8(decrypted).map_err(|_| CipherError::DecryptionFailed)
    }
}

/// One encrypted message payload as it appears on the public record
///
/// # Wire Format
///
/// ```text
/// [ nonce: 12 bytes ][ ciphertext + tag: >= 17 bytes ]
/// ```
///
/// Hex-encoded ("0x"-prefixed) for transport; stored as raw bytes on the
/// ledger. The format must stay bit-exact across implementations or members
/// stop being able to read each other's messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope(Vec<u8>);

impl From<Vec<u8>> for Envelope {
    fn from(bytes: Vec<u8>) -> Self {
        Envelope(bytes)
    }
}

impl From<Envelope> for Vec<u8> {
    fn from(envelope: Envelope) -> Self {
        envelope.0
    }
}

impl Envelope {
    /// Parse an envelope from an optionally "0x"-prefixed hex string
    ///
    /// Malformed hex is folded into [`CipherError::DecryptionFailed`]: on the
    /// decrypt path a garbled envelope and a wrong key must look the same.
    pub fn from_hex(hex: &str) -> Result<Self, CipherError> {
        let bytes = hex_to_bytes(hex).map_err(|_| CipherError::DecryptionFailed)?;
        Ok(Envelope(bytes))
    }

    /// Convert the envelope to a "0x"-prefixed hex string
    pub fn to_hex(&self) -> String {
        bytes_to_hex(&self.0)
    }

    /// Get a reference to the raw envelope bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}
