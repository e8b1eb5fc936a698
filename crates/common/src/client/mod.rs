//! # Client Synchronization Layer
//!
//! [`Client`] sequences everything a member does against the shared record:
//! refreshing the net list, joining, running the key handshake, sending and
//! decrypting messages. It is generic over the two external collaborators
//! ([`NetLedger`], [`KeyGate`]) so the same sequencing runs against the
//! in-process providers in tests and against remote backends in a deployment.
//!
//! Two rules shape every method:
//!
//! - **Mutations are confirmed by re-reading.** A submission is never surfaced
//!   as success on the strength of the request alone; the affected state is
//!   fetched back first.
//! - **Plaintext stays local.** Recovered secrets and decrypted messages live
//!   only in the [`PlaintextCache`], which drops a net's message plaintext
//!   whenever that net's log is reloaded.

mod cache;
pub mod ops;

pub use cache::PlaintextCache;
pub use ops::BundleError;

use crate::crypto::{
    CipherError, Envelope, PublicKey, SealedSecretError, SecretKey, SharedSecret,
};
use crate::gate::{
    AuthorizationProof, DecryptionRequest, InputProof, KeyGate, KeyGateError, ValidityWindow,
};
use crate::ledger::{NetId, NetInfo, NetLedger, NetLedgerError};

/// Default page size when reading a net's message log
pub const DEFAULT_MESSAGE_PAGE: u64 = 50;
/// Default validity window for authorization proofs: 10 days, in seconds
pub const DEFAULT_AUTHORIZATION_WINDOW_SECS: u64 = 10 * 24 * 60 * 60;

/// Errors surfaced by the client layer
///
/// Every failure keeps its distinguishing reason: validation, authorization,
/// crypto, and backend faults stay separate so callers can decide whether to
/// retry, fix input, or request access.
#[derive(Debug, thiserror::Error)]
pub enum ClientError<LE, GE>
where
    LE: std::fmt::Display + std::fmt::Debug,
    GE: std::fmt::Display + std::fmt::Debug,
{
    #[error("ledger error: {0}")]
    Ledger(#[from] NetLedgerError<LE>),
    #[error("key gate error: {0}")]
    Gate(#[from] KeyGateError<GE>),
    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),
    #[error("sealed secret error: {0}")]
    Sealed(#[from] SealedSecretError),
    /// The net's shared key has not been recovered this session
    #[error("shared key for net {0} has not been decrypted")]
    KeyNotDecrypted(NetId),
    /// The message index is outside the locally loaded snapshot
    #[error("message {1} not loaded for net {0}")]
    MessageNotLoaded(NetId, u64),
    /// A mutation's effects were not visible on the confirmation re-read
    #[error("submission not visible after confirmation re-read")]
    ConfirmationFailed,
}

impl<LE, GE> From<BundleError<LE, GE>> for ClientError<LE, GE>
where
    LE: std::fmt::Display + std::fmt::Debug,
    GE: std::fmt::Display + std::fmt::Debug,
{
    fn from(err: BundleError<LE, GE>) -> Self {
        match err {
            BundleError::Ledger(e) => ClientError::Ledger(e),
            BundleError::Gate(e) => ClientError::Gate(e),
        }
    }
}

/// One net as shown in a refreshed listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetSummary {
    pub net_id: NetId,
    pub info: NetInfo,
}

/// One message as held in the client's local snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    /// Position in the net's append-only log
    pub index: u64,
    pub sender: PublicKey,
    pub timestamp: u64,
    /// The encrypted envelope bytes as stored on the record
    pub payload: Vec<u8>,
}

fn now_unix() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// A member's view of the system
///
/// Owns the member identity, the provider handles, the latest immutable
/// snapshot of each net's messages, and the plaintext cache.
#[derive(Debug)]
pub struct Client<L, G>
where
    L: NetLedger,
    G: KeyGate,
{
    ledger: L,
    gate: G,
    key: SecretKey,
    /// Latest loaded page per net; replaced wholesale on each reload
    snapshots: std::collections::HashMap<NetId, Vec<MessageRecord>>,
    cache: PlaintextCache,
}

impl<L, G> Client<L, G>
where
    L: NetLedger,
    G: KeyGate,
{
    pub fn new(ledger: L, gate: G, key: SecretKey) -> Self {
        Self {
            ledger,
            gate,
            key,
            snapshots: std::collections::HashMap::new(),
            cache: PlaintextCache::new(),
        }
    }

    /// This client's member identity
    pub fn identity(&self) -> PublicKey {
        self.key.public()
    }

    /// Re-read all net records, length-first
    pub async fn refresh_nets(&self) -> Result<Vec<NetSummary>, ClientError<L::Error, G::Error>> {
        let count = self.ledger.net_count().await?;
        let mut summaries = Vec::with_capacity(count as usize);
        for net_id in 0..count {
            let info = self.ledger.net_info(net_id).await?;
            summaries.push(NetSummary { net_id, info });
        }
        Ok(summaries)
    }

    /// Whether this client's identity is currently a member of the net
    pub async fn is_member(&self, net_id: NetId) -> Result<bool, ClientError<L::Error, G::Error>> {
        Ok(self.ledger.is_member(net_id, self.identity()).await?)
    }

    /// Create a net with a freshly generated shared secret
    ///
    /// Runs the gate/ledger bundle, confirms the net is visible, and caches
    /// the secret so the creator can send immediately without a handshake.
    pub async fn create_net(
        &mut self,
        name: String,
    ) -> Result<NetSummary, ClientError<L::Error, G::Error>> {
        self.create_net_with_secret(name, SharedSecret::generate())
            .await
    }

    /// Create a net with a caller-supplied shared secret
    pub async fn create_net_with_secret(
        &mut self,
        name: String,
        secret: SharedSecret,
    ) -> Result<NetSummary, ClientError<L::Error, G::Error>> {
        let proof = InputProof::bind(&secret, &self.key);
        let (net_id, _handle) = ops::create_net(
            &self.ledger,
            &self.gate,
            self.identity(),
            name,
            secret,
            proof,
        )
        .await?;

        // confirm the submission landed before surfacing success
        let count = self.ledger.net_count().await?;
        if net_id >= count {
            return Err(ClientError::ConfirmationFailed);
        }
        let info = self.ledger.net_info(net_id).await?;

        self.cache.put_secret(net_id, secret);
        tracing::info!("created net {} ({})", net_id, info.name);
        Ok(NetSummary { net_id, info })
    }

    /// Join a net and confirm membership landed
    pub async fn join_net(&mut self, net_id: NetId) -> Result<(), ClientError<L::Error, G::Error>> {
        ops::join_net(&self.ledger, &self.gate, self.identity(), net_id).await?;

        if !self.ledger.is_member(net_id, self.identity()).await? {
            return Err(ClientError::ConfirmationFailed);
        }
        tracing::info!("joined net {}", net_id);
        Ok(())
    }

    /// Recover the net's shared secret through the authorization handshake
    ///
    /// Generates an ephemeral session keypair and a freshly signed proof per
    /// call; proofs are never cached or replayed. The recovered secret is
    /// cached for the rest of the session.
    pub async fn decrypt_net_key(
        &mut self,
        net_id: NetId,
    ) -> Result<SharedSecret, ClientError<L::Error, G::Error>> {
        if let Some(secret) = self.cache.secret(net_id) {
            return Ok(*secret);
        }

        let handle = self.ledger.encrypted_key_handle(net_id).await?;
        let session = SecretKey::generate();
        let proof = AuthorizationProof::sign(
            DecryptionRequest {
                handle,
                identity: self.identity(),
                session_key: session.public(),
                window: ValidityWindow::new(now_unix(), DEFAULT_AUTHORIZATION_WINDOW_SECS),
            },
            &self.key,
        );

        let sealed = self.gate.authorize_and_decrypt(&proof, now_unix()).await?;
        let secret = sealed.open(&session)?;

        self.cache.put_secret(net_id, secret);
        tracing::debug!("recovered shared key for net {}", net_id);
        Ok(secret)
    }

    /// Reload a page of the net's message log
    ///
    /// Replaces the local snapshot and drops the net's plaintext cache:
    /// plaintext is re-derived on demand against the fresh snapshot, never
    /// carried across reloads.
    pub async fn load_messages(
        &mut self,
        net_id: NetId,
        start: u64,
        limit: u64,
    ) -> Result<&[MessageRecord], ClientError<L::Error, G::Error>> {
        let page = self.ledger.messages(net_id, start, limit).await?;

        let mut records = Vec::with_capacity(page.len());
        for (offset, ((sender, timestamp), payload)) in page
            .senders
            .into_iter()
            .zip(page.timestamps)
            .zip(page.payloads)
            .enumerate()
        {
            records.push(MessageRecord {
                index: start + offset as u64,
                sender,
                timestamp,
                payload,
            });
        }

        self.cache.invalidate_messages(net_id);
        let snapshot = self.snapshots.entry(net_id).or_default();
        *snapshot = records;
        Ok(snapshot)
    }

    /// The locally held snapshot for a net, if any page was loaded
    pub fn messages(&self, net_id: NetId) -> Option<&[MessageRecord]> {
        self.snapshots.get(&net_id).map(Vec::as_slice)
    }

    /// Encrypt and send a text message, then reload the log
    ///
    /// Requires the shared key to have been recovered this session; the send
    /// path never runs the handshake implicitly.
    pub async fn send_message(
        &mut self,
        net_id: NetId,
        text: &str,
    ) -> Result<(), ClientError<L::Error, G::Error>> {
        let secret = *self
            .cache
            .secret(net_id)
            .ok_or(ClientError::KeyNotDecrypted(net_id))?;
        let envelope = secret.derive_key().encrypt(text)?;

        self.ledger
            .send_message(self.identity(), net_id, envelope.as_bytes().to_vec())
            .await?;

        // re-read the log rather than trusting a local optimistic update
        self.load_messages(net_id, 0, DEFAULT_MESSAGE_PAGE).await?;
        Ok(())
    }

    /// Decrypt one message from the local snapshot, lazily and cached
    pub async fn decrypt_message(
        &mut self,
        net_id: NetId,
        index: u64,
    ) -> Result<String, ClientError<L::Error, G::Error>> {
        if let Some(plaintext) = self.cache.message(net_id, index) {
            return Ok(plaintext.clone());
        }

        let record = self
            .snapshots
            .get(&net_id)
            .and_then(|records| records.iter().find(|r| r.index == index))
            .ok_or(ClientError::MessageNotLoaded(net_id, index))?;
        let envelope = Envelope::from(record.payload.clone());

        let secret = *self
            .cache
            .secret(net_id)
            .ok_or(ClientError::KeyNotDecrypted(net_id))?;
        let plaintext = secret.derive_key().decrypt(&envelope)?;

        self.cache.put_message(net_id, index, plaintext.clone());
        Ok(plaintext)
    }
}
