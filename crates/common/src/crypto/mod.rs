//! Cryptographic primitives for ShroudNet
//!
//! This module provides the cryptographic foundation for ShroudNet's security model:
//!
//! - **Identity & Authentication**: Ed25519 keypairs for member identity
//! - **Key Derivation**: SHA-256 over a net's 160-bit shared secret
//! - **Message Encryption**: AES-256-GCM envelopes for message payloads
//! - **Handshake Sealing**: ECDH-based sealing using X25519 curve conversion
//!
//! # Security Model
//!
//! ## Member Identity
//! Each member has an Ed25519 keypair (`SecretKey`/`PublicKey`) that serves as their
//! identity on the ledger. The same keypair signs transactions and authorization proofs.
//!
//! ## Message Encryption
//! Every net has a single 20-byte shared secret for its whole lifetime. All members
//! derive the same AES-256-GCM key from it (SHA-256, no salt), so any member can
//! decrypt any message in the net. There is no forward secrecy and no key rotation;
//! only message content is protected, never metadata.
//!
//! ## Handshake Sealing
//! When the key gate releases a net's shared secret to an authorized member:
//! 1. The member generates an ephemeral Ed25519 session keypair
//! 2. The gate converts both session keys to X25519 (Montgomery curve)
//! 3. ECDH derives a one-off wrapping key
//! 4. AES-KW (with padding) wraps the shared secret under it
//! 5. The result ships as a `SealedSecret` (ephemeral_pubkey || wrapped_secret)
//!
//! The member recovers the secret with the ephemeral private key; the plaintext
//! never crosses the gate boundary unprotected.

mod envelope;
pub mod hex;
mod keys;
mod sealed;
mod secret;

pub use ed25519_dalek::Signature;
pub use envelope::{CipherError, Envelope, MessageKey, MIN_ENVELOPE_SIZE, NONCE_SIZE};
pub use hex::{bytes_to_hex, hex_to_bytes, HexError};
pub use keys::{KeyError, PublicKey, SecretKey, PUBLIC_KEY_SIZE};
pub use sealed::{SealedSecret, SealedSecretError, SEALED_SECRET_SIZE};
pub use secret::{SecretError, SharedSecret, SHARED_SECRET_SIZE};
