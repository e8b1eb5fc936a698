use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::crypto::{PublicKey, SealedSecret, SharedSecret};

use super::provider::{
    AuthorizationProof, InputProof, KeyGate, KeyGateError, SecretHandle,
};

/// In-memory key gate backend using HashMaps
///
/// Stands in for the confidential-compute coprocessor: it holds each secret
/// next to its access list and enforces the authorization handshake, but the
/// at-rest storage is ordinary process memory. Good enough for a single trusted
/// node and for tests; not a confidentiality boundary against the host.
#[derive(Debug, Clone)]
pub struct MemoryKeyGate {
    inner: Arc<RwLock<MemoryKeyGateInner>>,
}

#[derive(Debug, Default)]
struct MemoryKeyGateInner {
    /// Store secrets: handle -> (secret, access list)
    secrets: HashMap<SecretHandle, StoredSecret>,
}

#[derive(Debug)]
struct StoredSecret {
    secret: SharedSecret,
    /// Hex-encoded identities allowed to decrypt; grows, never shrinks
    access: BTreeSet<String>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryKeyGateError {
    #[error("memory gate error: {0}")]
    Internal(String),
}

impl MemoryKeyGate {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryKeyGateInner::default())),
        }
    }
}

impl Default for MemoryKeyGate {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyGate for MemoryKeyGate {
    type Error = MemoryKeyGateError;

    async fn submit_secret(
        &self,
        secret: SharedSecret,
        owner: PublicKey,
        proof: InputProof,
    ) -> Result<SecretHandle, KeyGateError<Self::Error>> {
        // The reference backend reads the opaque proof as an Ed25519 signature
        // over the canonical binding message
        let signature_bytes: &[u8; 64] = proof
            .bytes()
            .try_into()
            .map_err(|_| KeyGateError::InvalidProof)?;
        let signature = crate::crypto::Signature::from_bytes(signature_bytes);
        let binding = InputProof::binding_message(&secret, &owner);
        if owner.verify(&binding, &signature).is_err() {
            return Err(KeyGateError::InvalidProof);
        }

        let mut inner = self.inner.write().map_err(|e| {
            KeyGateError::Provider(MemoryKeyGateError::Internal(format!(
                "failed to acquire write lock: {}",
                e
            )))
        })?;

        let handle = SecretHandle::generate();
        inner.secrets.insert(
            handle,
            StoredSecret {
                secret,
                access: BTreeSet::from([owner.to_hex()]),
            },
        );

        tracing::debug!("stored secret under handle {} for {}", handle, owner);
        Ok(handle)
    }

    async fn extend_access(
        &self,
        handle: SecretHandle,
        identity: PublicKey,
    ) -> Result<(), KeyGateError<Self::Error>> {
        let mut inner = self.inner.write().map_err(|e| {
            KeyGateError::Provider(MemoryKeyGateError::Internal(format!(
                "failed to acquire write lock: {}",
                e
            )))
        })?;

        let stored = inner
            .secrets
            .get_mut(&handle)
            .ok_or(KeyGateError::UnknownHandle(handle))?;

        stored.access.insert(identity.to_hex());
        tracing::debug!("extended access on {} to {}", handle, identity);
        Ok(())
    }

    async fn authorize_and_decrypt(
        &self,
        proof: &AuthorizationProof,
        now: u64,
    ) -> Result<SealedSecret, KeyGateError<Self::Error>> {
        // Signature failure and not-on-list are both AccessDenied on purpose
        if !proof.verify() {
            tracing::warn!(
                "rejected decryption proof with bad signature for {}",
                proof.request.identity
            );
            return Err(KeyGateError::AccessDenied);
        }

        let window = proof.request.window;
        if !window.contains(now) {
            return Err(KeyGateError::ProofExpired {
                issued_at: window.issued_at,
                duration_secs: window.duration_secs,
            });
        }

        let inner = self.inner.read().map_err(|e| {
            KeyGateError::Provider(MemoryKeyGateError::Internal(format!(
                "failed to acquire read lock: {}",
                e
            )))
        })?;

        let handle = proof.request.handle;
        let stored = inner
            .secrets
            .get(&handle)
            .ok_or(KeyGateError::UnknownHandle(handle))?;

        if !stored.access.contains(&proof.request.identity.to_hex()) {
            tracing::warn!(
                "denied decryption of {} to {}",
                handle,
                proof.request.identity
            );
            return Err(KeyGateError::AccessDenied);
        }

        let sealed = SealedSecret::seal(&stored.secret, &proof.request.session_key)
            .map_err(|e| MemoryKeyGateError::Internal(format!("sealing failed: {}", e)))?;

        tracing::debug!("released {} to {}", handle, proof.request.identity);
        Ok(sealed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SecretKey;
    use crate::gate::provider::{DecryptionRequest, ValidityWindow};

    fn proof_for(
        handle: SecretHandle,
        identity: &SecretKey,
        session: &SecretKey,
        issued_at: u64,
    ) -> AuthorizationProof {
        AuthorizationProof::sign(
            DecryptionRequest {
                handle,
                identity: identity.public(),
                session_key: session.public(),
                window: ValidityWindow::new(issued_at, 60),
            },
            identity,
        )
    }

    #[tokio::test]
    async fn test_submitter_can_decrypt() {
        let gate = MemoryKeyGate::new();
        let alice = SecretKey::generate();
        let secret = SharedSecret::generate();

        let handle = gate
            .submit_secret(secret, alice.public(), InputProof::bind(&secret, &alice))
            .await
            .unwrap();

        let session = SecretKey::generate();
        let sealed = gate
            .authorize_and_decrypt(&proof_for(handle, &alice, &session, 100), 100)
            .await
            .unwrap();
        assert_eq!(sealed.open(&session).unwrap(), secret);
    }

    #[tokio::test]
    async fn test_bad_binding_proof_rejected() {
        let gate = MemoryKeyGate::new();
        let alice = SecretKey::generate();
        let mallory = SecretKey::generate();
        let secret = SharedSecret::generate();

        // proof signed by someone other than the claimed owner
        let result = gate
            .submit_secret(secret, alice.public(), InputProof::bind(&secret, &mallory))
            .await;
        assert!(matches!(result, Err(KeyGateError::InvalidProof)));

        // garbage proof bytes
        let result = gate
            .submit_secret(secret, alice.public(), InputProof::from(vec![1, 2, 3]))
            .await;
        assert!(matches!(result, Err(KeyGateError::InvalidProof)));
    }

    #[tokio::test]
    async fn test_non_member_denied_until_extended() {
        let gate = MemoryKeyGate::new();
        let alice = SecretKey::generate();
        let bob = SecretKey::generate();
        let secret = SharedSecret::generate();

        let handle = gate
            .submit_secret(secret, alice.public(), InputProof::bind(&secret, &alice))
            .await
            .unwrap();

        let session = SecretKey::generate();
        let result = gate
            .authorize_and_decrypt(&proof_for(handle, &bob, &session, 100), 100)
            .await;
        assert!(matches!(result, Err(KeyGateError::AccessDenied)));

        gate.extend_access(handle, bob.public()).await.unwrap();

        let sealed = gate
            .authorize_and_decrypt(&proof_for(handle, &bob, &session, 100), 100)
            .await
            .unwrap();
        assert_eq!(sealed.open(&session).unwrap(), secret);
    }

    #[tokio::test]
    async fn test_expired_proof_rejected() {
        let gate = MemoryKeyGate::new();
        let alice = SecretKey::generate();
        let secret = SharedSecret::generate();

        let handle = gate
            .submit_secret(secret, alice.public(), InputProof::bind(&secret, &alice))
            .await
            .unwrap();

        let session = SecretKey::generate();
        let stale = proof_for(handle, &alice, &session, 100);

        // replayed past its window
        let result = gate.authorize_and_decrypt(&stale, 100 + 61).await;
        assert!(matches!(result, Err(KeyGateError::ProofExpired { .. })));

        // a fresh proof for the same identity succeeds
        let fresh = proof_for(handle, &alice, &session, 100 + 61);
        assert!(gate.authorize_and_decrypt(&fresh, 100 + 61).await.is_ok());
    }

    #[tokio::test]
    async fn test_forged_proof_rejected() {
        let gate = MemoryKeyGate::new();
        let alice = SecretKey::generate();
        let mallory = SecretKey::generate();
        let secret = SharedSecret::generate();

        let handle = gate
            .submit_secret(secret, alice.public(), InputProof::bind(&secret, &alice))
            .await
            .unwrap();

        // mallory signs a request claiming to be alice
        let session = SecretKey::generate();
        let forged = AuthorizationProof::sign(
            DecryptionRequest {
                handle,
                identity: alice.public(),
                session_key: session.public(),
                window: ValidityWindow::new(100, 60),
            },
            &mallory,
        );
        let result = gate.authorize_and_decrypt(&forged, 100).await;
        assert!(matches!(result, Err(KeyGateError::AccessDenied)));
    }

    #[tokio::test]
    async fn test_unknown_handle() {
        let gate = MemoryKeyGate::new();
        let alice = SecretKey::generate();
        let session = SecretKey::generate();

        let handle = SecretHandle::generate();
        let result = gate
            .authorize_and_decrypt(&proof_for(handle, &alice, &session, 0), 0)
            .await;
        assert!(matches!(result, Err(KeyGateError::UnknownHandle(_))));

        let result = gate.extend_access(handle, alice.public()).await;
        assert!(matches!(result, Err(KeyGateError::UnknownHandle(_))));
    }

    #[tokio::test]
    async fn test_extend_is_idempotent() {
        let gate = MemoryKeyGate::new();
        let alice = SecretKey::generate();
        let bob = SecretKey::generate();
        let secret = SharedSecret::generate();

        let handle = gate
            .submit_secret(secret, alice.public(), InputProof::bind(&secret, &alice))
            .await
            .unwrap();

        gate.extend_access(handle, bob.public()).await.unwrap();
        gate.extend_access(handle, bob.public()).await.unwrap();

        let session = SecretKey::generate();
        let sealed = gate
            .authorize_and_decrypt(&proof_for(handle, &bob, &session, 0), 0)
            .await
            .unwrap();
        assert_eq!(sealed.open(&session).unwrap(), secret);
    }
}
