//! # Confidential Secret Distribution Gate
//!
//! The gate is the single point of trust for confidentiality of each net's
//! shared secret. It stores the secret under an opaque handle, keeps an access
//! list per handle, and releases the plaintext only through an authorization
//! handshake, sealed to an ephemeral session key, never in the clear.
//!
//! The gate is a capability interface ([`KeyGate`]), not a scheme: the real
//! deployment target is an external confidential-compute coprocessor whose
//! internal encryption and proof system are opaque to this crate. Any
//! access-controlled secret-sharing backend satisfies the contract.
//! [`MemoryKeyGate`] is the reference in-process backend.
//!
//! ## Access lifecycle
//!
//! - `submit_secret` creates the handle with the submitting identity as the
//!   sole authorized party
//! - `extend_access` adds identities as they join the net; the list never
//!   shrinks
//! - `authorize_and_decrypt` checks a freshly signed [`AuthorizationProof`]
//!   (identity, session key, validity window) before sealing the secret out

pub mod memory;
mod provider;

pub use memory::{MemoryKeyGate, MemoryKeyGateError};
pub use provider::{
    AuthorizationProof, DecryptionRequest, InputProof, KeyGate, KeyGateError, SecretHandle,
    ValidityWindow, HANDLE_SIZE,
};
