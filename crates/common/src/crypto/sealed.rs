//! Sealed handshake responses using ECDH + AES Key Wrap
//!
//! When the key gate releases a net's shared secret to an authorized member, the
//! plaintext must not cross the gate boundary unprotected. The gate seals it to
//! the ephemeral session key named in the member's authorization proof:
//!
//! 1. **Generate ephemeral keypair**: the gate creates a one-off Ed25519 keypair
//! 2. **Perform ECDH**: both keys convert to X25519 and agree on a wrapping key
//! 3. **Wrap the secret**: AES-KW with padding (RFC 5649, the payload is 20
//!    bytes) encrypts the shared secret under the wrapping key
//! 4. **Package**: a `SealedSecret` carries the ephemeral public key and the
//!    wrapped secret
//!
//! The member recovers the secret by:
//! 1. Extracting the ephemeral public key from the sealed response
//! 2. Performing ECDH with the session private key
//! 3. Unwrapping the secret
//!
//! A sealed response is single-use by construction: the session keypair is
//! discarded after the handshake, so captured responses cannot be opened later.

use std::convert::TryFrom;

use aes_kw::KekAes256 as Kek;
use serde::{Deserialize, Serialize};

use super::hex::strip_0x;
use super::keys::{KeyError, PublicKey, SecretKey, PUBLIC_KEY_SIZE};
use super::secret::{SecretError, SharedSecret, SHARED_SECRET_SIZE};

/// Size of the AES-KW-with-padding header in bytes
pub const KW_HEADER_SIZE: usize = 8;
/// Size of the wrapped secret in bytes (20-byte payload padded to 24, plus header)
pub const WRAPPED_SECRET_SIZE: usize = KW_HEADER_SIZE + 24;
/// Total size of a sealed secret in bytes
///
/// Layout: ephemeral_pubkey (32) || wrapped_secret (32) = 64 bytes
pub const SEALED_SECRET_SIZE: usize = PUBLIC_KEY_SIZE + WRAPPED_SECRET_SIZE;

/// Errors that can occur while sealing or opening a secret
#[derive(Debug, thiserror::Error)]
pub enum SealedSecretError {
    #[error("sealed secret error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("key error: {0}")]
    Key(#[from] KeyError),
    #[error("secret error: {0}")]
    Secret(#[from] SecretError),
}

/// A shared secret sealed to a single recipient
///
/// Contains an ephemeral public key and an AES-KW wrapped secret. Only the
/// holder of the recipient private key used during sealing can open it.
///
/// # Wire Format
///
/// ```text
/// [ ephemeral_pubkey: 32 bytes ][ wrapped_secret: 32 bytes ]
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct SealedSecret(pub(crate) [u8; SEALED_SECRET_SIZE]);

impl Serialize for SealedSecret {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for SealedSecret {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{Error, Visitor};
        use std::fmt;

        struct SealedVisitor;

        impl<'de> Visitor<'de> for SealedVisitor {
            type Value = SealedSecret;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a byte array or sequence of SEALED_SECRET_SIZE")
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: Error,
            {
                if v.len() != SEALED_SECRET_SIZE {
                    return Err(E::invalid_length(
                        v.len(),
                        &format!("expected {} bytes", SEALED_SECRET_SIZE).as_str(),
                    ));
                }
                let mut array = [0u8; SEALED_SECRET_SIZE];
                array.copy_from_slice(v);
                Ok(SealedSecret(array))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut bytes = Vec::new();
                while let Some(byte) = seq.next_element::<u8>()? {
                    bytes.push(byte);
                }
                if bytes.len() != SEALED_SECRET_SIZE {
                    return Err(A::Error::invalid_length(
                        bytes.len(),
                        &format!("expected {} bytes", SEALED_SECRET_SIZE).as_str(),
                    ));
                }
                let mut array = [0u8; SEALED_SECRET_SIZE];
                array.copy_from_slice(&bytes);
                Ok(SealedSecret(array))
            }
        }

        // Try bytes first (for binary formats), fallback to seq (for JSON)
        deserializer.deserialize_byte_buf(SealedVisitor)
    }
}

impl Default for SealedSecret {
    fn default() -> Self {
        SealedSecret([0; SEALED_SECRET_SIZE])
    }
}

impl From<[u8; SEALED_SECRET_SIZE]> for SealedSecret {
    fn from(bytes: [u8; SEALED_SECRET_SIZE]) -> Self {
        SealedSecret(bytes)
    }
}

impl TryFrom<&[u8]> for SealedSecret {
    type Error = SealedSecretError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != SEALED_SECRET_SIZE {
            return Err(anyhow::anyhow!(
                "invalid sealed secret size, expected {}, got {}",
                SEALED_SECRET_SIZE,
                bytes.len()
            )
            .into());
        }
        let mut sealed = SealedSecret::default();
        sealed.0.copy_from_slice(bytes);
        Ok(sealed)
    }
}

impl SealedSecret {
    /// Parse a sealed secret from a hexadecimal string
    ///
    /// Accepts both plain hex and "0x"-prefixed hex strings.
    pub fn from_hex(hex: &str) -> Result<Self, SealedSecretError> {
        let hex = strip_0x(hex);
        let mut buff = [0; SEALED_SECRET_SIZE];
        hex::decode_to_slice(hex, &mut buff).map_err(|_| anyhow::anyhow!("hex decode error"))?;
        Ok(SealedSecret::from(buff))
    }

    /// Convert the sealed secret to a hexadecimal string
    #[allow(clippy::wrong_self_convention)]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Seal a shared secret for a specific recipient
    ///
    /// 1. Generates an ephemeral Ed25519 keypair
    /// 2. Converts both keys to X25519 for ECDH
    /// 3. Performs ECDH to derive a wrapping key
    /// 4. Wraps the secret with AES-KW (padded)
    /// 5. Returns `[ephemeral_pubkey || wrapped_secret]`
    ///
    /// # Arguments
    ///
    /// * `secret` - The net's shared secret
    /// * `recipient` - The public key the response is sealed to (usually an
    ///   ephemeral session key from an authorization proof)
    ///
    /// # Errors
    ///
    /// Returns an error if key conversion or wrapping fails.
    pub fn seal(secret: &SharedSecret, recipient: &PublicKey) -> Result<Self, SealedSecretError> {
        // Generate ephemeral Ed25519 keypair
        let ephemeral_private = SecretKey::generate();
        let ephemeral_public = ephemeral_private.public();

        // Convert both keys to X25519 for ECDH
        let ephemeral_x25519_private = ephemeral_private.to_x25519();
        let recipient_x25519_public = recipient.to_x25519()?;

        // Perform ECDH to get the wrapping key
        let wrapping_key = ephemeral_x25519_private.diffie_hellman(&recipient_x25519_public);

        let kek = Kek::from(*wrapping_key.as_bytes());
        let wrapped = kek
            .wrap_with_padding_vec(secret.bytes())
            .map_err(|_| anyhow::anyhow!("AES-KW wrap error"))?;

        // Build sealed bytes: ephemeral_public_key || wrapped_secret
        let mut sealed = SealedSecret::default();
        let ephemeral_bytes = ephemeral_public.to_bytes();

        // sanity check we're getting `SEALED_SECRET_SIZE` bytes here
        if ephemeral_bytes.len() + wrapped.len() != SEALED_SECRET_SIZE {
            return Err(anyhow::anyhow!("expected sealed secret size is incorrect").into());
        };

        sealed.0[..PUBLIC_KEY_SIZE].copy_from_slice(&ephemeral_bytes);
        sealed.0[PUBLIC_KEY_SIZE..PUBLIC_KEY_SIZE + wrapped.len()].copy_from_slice(&wrapped);

        Ok(sealed)
    }

    /// Open the sealed secret using the recipient's private key
    ///
    /// This reverses the sealing process:
    /// 1. Extracts the ephemeral public key
    /// 2. Converts keys to X25519 for ECDH
    /// 3. Performs ECDH to derive the same wrapping key
    /// 4. Unwraps the secret
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Key conversion fails
    /// - AES-KW unwrapping fails (wrong key or corrupted data)
    /// - The unwrapped secret has an incorrect size
    ///
    /// # Security Note
    ///
    /// A failure here means the response was sealed for a different recipient,
    /// was corrupted, or was tampered with.
    pub fn open(&self, recipient_secret: &SecretKey) -> Result<SharedSecret, SealedSecretError> {
        // Extract the ephemeral public key
        let ephemeral_public_bytes = &self.0[..PUBLIC_KEY_SIZE];
        let ephemeral_public = PublicKey::try_from(ephemeral_public_bytes)?;

        // Convert keys to X25519 for ECDH
        let recipient_x25519_private = recipient_secret.to_x25519();
        let ephemeral_x25519_public = ephemeral_public.to_x25519()?;

        // Perform ECDH to get the same wrapping key
        let wrapping_key = recipient_x25519_private.diffie_hellman(&ephemeral_x25519_public);

        let kek = Kek::from(*wrapping_key.as_bytes());
        let wrapped_data = &self.0[PUBLIC_KEY_SIZE..];

        let unwrapped = kek
            .unwrap_with_padding_vec(wrapped_data)
            .map_err(|_| anyhow::anyhow!("AES-KW unwrap error"))?;

        if unwrapped.len() != SHARED_SECRET_SIZE {
            return Err(anyhow::anyhow!("unwrapped secret has wrong size").into());
        }

        Ok(SharedSecret::from_slice(&unwrapped)?)
    }

    /// Get a reference to the raw sealed bytes
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_seal_open() {
        let secret = SharedSecret::from_slice(&[42u8; SHARED_SECRET_SIZE]).unwrap();
        let private_key = SecretKey::generate();
        let public_key = private_key.public();
        let sealed = SealedSecret::seal(&secret, &public_key).unwrap();
        let recovered = sealed.open(&private_key).unwrap();
        assert_eq!(secret, recovered);
    }

    #[test]
    fn test_open_with_wrong_key_fails() {
        let secret = SharedSecret::generate();
        let alice_private = SecretKey::generate();
        let alice_public = alice_private.public();
        let bob_private = SecretKey::generate();
        // Sealed for Alice
        let sealed = SealedSecret::seal(&secret, &alice_public).unwrap();
        // Alice can open it
        let recovered_by_alice = sealed.open(&alice_private).unwrap();
        assert_eq!(secret, recovered_by_alice);
        // Bob cannot
        let result = sealed.open(&bob_private);
        assert!(result.is_err());
    }

    #[test]
    fn test_hex_roundtrip() {
        let secret = SharedSecret::generate();
        let private_key = SecretKey::generate();
        let sealed = SealedSecret::seal(&secret, &private_key.public()).unwrap();
        let hex = sealed.to_hex();
        let recovered = SealedSecret::from_hex(&hex).unwrap();
        assert_eq!(sealed, recovered);
        assert_eq!(recovered.open(&private_key).unwrap(), secret);
    }

    #[test]
    fn test_serde_json_roundtrip() {
        let secret = SharedSecret::generate();
        let private_key = SecretKey::generate();
        let sealed = SealedSecret::seal(&secret, &private_key.public()).unwrap();

        let json = serde_json::to_string(&sealed).unwrap();
        let recovered: SealedSecret = serde_json::from_str(&json).unwrap();

        assert_eq!(sealed, recovered);
        assert_eq!(recovered.open(&private_key).unwrap(), secret);
    }

    #[test]
    fn test_invalid_length_rejected() {
        let short = vec![0u8; SEALED_SECRET_SIZE - 1];
        assert!(SealedSecret::try_from(short.as_slice()).is_err());

        let long = vec![0u8; SEALED_SECRET_SIZE + 1];
        assert!(SealedSecret::try_from(long.as_slice()).is_err());

        let exact = vec![0u8; SEALED_SECRET_SIZE];
        assert!(SealedSecret::try_from(exact.as_slice()).is_ok());
    }
}
