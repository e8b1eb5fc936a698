use std::fmt::{Debug, Display};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::crypto::{
    hex::strip_0x, PublicKey, SealedSecret, SecretKey, SharedSecret, Signature,
};

/// Size of an opaque secret handle in bytes
pub const HANDLE_SIZE: usize = 32;

/// Domain separator for secret submission binding proofs
const SUBMIT_DOMAIN: &[u8] = b"shroudnet.submit-secret.v1";
/// Domain separator for decryption authorization proofs
const AUTHORIZE_DOMAIN: &[u8] = b"shroudnet.authorize-decrypt.v1";

#[derive(Debug, thiserror::Error)]
pub enum KeyGateError<T> {
    /// The backend itself failed
    #[error("unhandled key gate provider error: {0}")]
    Provider(#[from] T),
    /// No secret is stored under the given handle
    #[error("unknown secret handle {0}")]
    UnknownHandle(SecretHandle),
    /// The submission binding proof does not verify
    #[error("invalid secret submission proof")]
    InvalidProof,
    /// The identity is not authorized for the handle
    ///
    /// Also returned when the proof signature does not verify: distinguishing
    /// the two would confirm access-list membership to outsiders.
    #[error("access denied")]
    AccessDenied,
    /// The proof's validity window does not contain the current time
    ///
    /// Recoverable by signing a fresh proof, unlike [`KeyGateError::AccessDenied`].
    #[error("authorization proof expired (issued at {issued_at}, valid {duration_secs}s)")]
    ProofExpired { issued_at: u64, duration_secs: u64 },
}

/// Opaque reference to a confidentially stored shared secret
///
/// Handles appear on the public record (each net carries exactly one) and are
/// resolvable to plaintext only through [`KeyGate::authorize_and_decrypt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SecretHandle([u8; HANDLE_SIZE]);

impl From<[u8; HANDLE_SIZE]> for SecretHandle {
    fn from(bytes: [u8; HANDLE_SIZE]) -> Self {
        SecretHandle(bytes)
    }
}

impl std::fmt::Display for SecretHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl SecretHandle {
    /// Allocate a fresh random handle
    pub fn generate() -> Self {
        let mut buff = [0; HANDLE_SIZE];
        getrandom::getrandom(&mut buff).expect("failed to generate random bytes");
        Self(buff)
    }

    /// Parse a handle from an optionally "0x"-prefixed hex string
    pub fn from_hex(hex: &str) -> Result<Self, anyhow::Error> {
        let hex = strip_0x(hex);
        let mut buff = [0; HANDLE_SIZE];
        hex::decode_to_slice(hex, &mut buff)
            .map_err(|_| anyhow::anyhow!("secret handle hex decode error"))?;
        Ok(Self(buff))
    }

    /// Convert the handle to a "0x"-prefixed hex string
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Get a reference to the raw handle bytes
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Integrity proof accompanying a secret submission
///
/// Binds the submitted value to the submitting identity so the gate can reject
/// forwarded or replayed submissions. The format is owned by the gate backend;
/// the core treats it as opaque bytes and passes it through. The reference
/// backend interprets it as an Ed25519 signature over a domain-separated
/// binding message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputProof(Vec<u8>);

impl From<Vec<u8>> for InputProof {
    fn from(bytes: Vec<u8>) -> Self {
        InputProof(bytes)
    }
}

impl InputProof {
    /// Produce the binding proof the reference backend expects
    ///
    /// Signs `domain || secret || submitter` with the submitter's identity key.
    pub fn bind(secret: &SharedSecret, submitter: &SecretKey) -> Self {
        let msg = Self::binding_message(secret, &submitter.public());
        InputProof(submitter.sign(&msg).to_bytes().to_vec())
    }

    /// The canonical binding message for the reference backend
    pub(crate) fn binding_message(secret: &SharedSecret, submitter: &PublicKey) -> Vec<u8> {
        let mut msg = Vec::with_capacity(SUBMIT_DOMAIN.len() + 20 + 32);
        msg.extend_from_slice(SUBMIT_DOMAIN);
        msg.extend_from_slice(secret.bytes());
        msg.extend_from_slice(&submitter.to_bytes());
        msg
    }

    /// Get a reference to the raw proof bytes
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}

/// The time span during which an authorization proof may be used
///
/// Expiry is checked against a caller-supplied clock at use time; the window
/// is a plain value object, never an ambient timestamp. A proof must not be
/// cached and replayed past its window: callers sign a fresh one per
/// handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityWindow {
    /// Unix seconds at which the proof was issued
    pub issued_at: u64,
    /// Seconds the proof stays valid after issuance
    pub duration_secs: u64,
}

impl ValidityWindow {
    pub fn new(issued_at: u64, duration_secs: u64) -> Self {
        Self {
            issued_at,
            duration_secs,
        }
    }

    /// Whether `now` falls inside the window
    pub fn contains(&self, now: u64) -> bool {
        now >= self.issued_at && now <= self.issued_at.saturating_add(self.duration_secs)
    }
}

/// One decryption request: who wants which secret, delivered to which session key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionRequest {
    /// The handle whose plaintext is requested
    pub handle: SecretHandle,
    /// The long-term identity making the request
    pub identity: PublicKey,
    /// The ephemeral session key the response is sealed to
    pub session_key: PublicKey,
    /// When the request was issued and for how long it stays valid
    pub window: ValidityWindow,
}

impl DecryptionRequest {
    /// The canonical byte encoding covered by the proof signature
    pub fn to_signing_bytes(&self) -> Vec<u8> {
        let mut msg = Vec::with_capacity(AUTHORIZE_DOMAIN.len() + HANDLE_SIZE + 32 + 32 + 16);
        msg.extend_from_slice(AUTHORIZE_DOMAIN);
        msg.extend_from_slice(self.handle.bytes());
        msg.extend_from_slice(&self.identity.to_bytes());
        msg.extend_from_slice(&self.session_key.to_bytes());
        msg.extend_from_slice(&self.window.issued_at.to_be_bytes());
        msg.extend_from_slice(&self.window.duration_secs.to_be_bytes());
        msg
    }
}

/// A freshly signed authorization for one identity/handle pair
///
/// Carries the request and an Ed25519 signature over its canonical encoding by
/// the requesting identity. Verification happens gate-side before any secret
/// is released.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationProof {
    pub request: DecryptionRequest,
    pub signature: Signature,
}

impl AuthorizationProof {
    /// Sign a fresh proof for `request` with the requesting identity's key
    ///
    /// The key must match `request.identity` or the gate will refuse it.
    pub fn sign(request: DecryptionRequest, identity: &SecretKey) -> Self {
        let signature = identity.sign(&request.to_signing_bytes());
        Self { request, signature }
    }

    /// Check the proof signature against the request's claimed identity
    pub fn verify(&self) -> bool {
        self.request
            .identity
            .verify(&self.request.to_signing_bytes(), &self.signature)
            .is_ok()
    }
}

/// Capability interface over the confidential secret store
///
/// Implementations enforce, for each handle, which identities may obtain the
/// plaintext. The core's correctness depends entirely on never letting a
/// plaintext secret or a usable access grant leak to a non-member.
#[async_trait]
pub trait KeyGate: Send + Sync + Debug + Clone + 'static {
    type Error: Display + Debug;

    /// Store a secret and grant initial decrypt capability to `owner`
    ///
    /// `proof` must bind the secret to the submitting identity; its format is
    /// backend-defined.
    async fn submit_secret(
        &self,
        secret: SharedSecret,
        owner: PublicKey,
        proof: InputProof,
    ) -> Result<SecretHandle, KeyGateError<Self::Error>>;

    /// Add `identity` to the handle's access list
    ///
    /// Never shrinks the list and is idempotent: extending with an identity
    /// already on the list is a no-op.
    async fn extend_access(
        &self,
        handle: SecretHandle,
        identity: PublicKey,
    ) -> Result<(), KeyGateError<Self::Error>>;

    /// Release the secret to an authorized identity, sealed to its session key
    ///
    /// Succeeds only if the proof signature verifies, the identity is on the
    /// handle's access list, and the validity window contains `now`.
    async fn authorize_and_decrypt(
        &self,
        proof: &AuthorizationProof,
        now: u64,
    ) -> Result<SealedSecret, KeyGateError<Self::Error>>;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_validity_window() {
        let window = ValidityWindow::new(1_000, 60);
        assert!(window.contains(1_000));
        assert!(window.contains(1_030));
        assert!(window.contains(1_060));
        assert!(!window.contains(999));
        assert!(!window.contains(1_061));
    }

    #[test]
    fn test_proof_signature_roundtrip() {
        let identity = SecretKey::generate();
        let session = SecretKey::generate();
        let request = DecryptionRequest {
            handle: SecretHandle::generate(),
            identity: identity.public(),
            session_key: session.public(),
            window: ValidityWindow::new(0, 60),
        };

        let proof = AuthorizationProof::sign(request.clone(), &identity);
        assert!(proof.verify());

        // a proof signed by the wrong key does not verify
        let forged = AuthorizationProof::sign(request, &session);
        assert!(!forged.verify());
    }

    #[test]
    fn test_handle_hex_roundtrip() {
        let handle = SecretHandle::generate();
        let hex = handle.to_hex();
        assert!(hex.starts_with("0x"));
        assert_eq!(SecretHandle::from_hex(&hex).unwrap(), handle);
    }
}
