use std::fmt::{Debug, Display};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::crypto::PublicKey;
use crate::gate::SecretHandle;

/// Identifier of a net on the ledger
///
/// Assigned sequentially from 0 at creation, strictly increasing, never reused.
pub type NetId = u64;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NetLedgerError<T> {
    /// The backing record itself failed
    #[error("unhandled net ledger provider error: {0}")]
    Provider(#[from] T),
    /// The net id is out of range
    #[error("unknown net {0}")]
    UnknownNet(NetId),
    /// The caller is not a member of the net
    #[error("not a member of net {0}")]
    NotMember(NetId),
    /// The caller already joined the net
    ///
    /// Repeat joins are rejected rather than ignored so the member count can
    /// never drift from the membership relation.
    #[error("already a member of net {0}")]
    AlreadyMember(NetId),
    /// A net must have a non-empty display name
    #[error("empty net name")]
    EmptyName,
    /// A message payload must be non-empty
    #[error("empty message payload")]
    EmptyMessage,
}

/// Public metadata of one net
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetInfo {
    /// Display name, immutable after creation
    pub name: String,
    /// Creator identity, immutable
    pub creator: PublicKey,
    /// Creation time in unix seconds, immutable
    pub created_at: u64,
    /// Number of members; starts at 1, grows by one per successful join
    pub member_count: u32,
}

/// One page of a net's message log as parallel sequences
///
/// The query interface returns senders, timestamps, and payloads as three
/// sequences of equal length rather than a list of records, the shape readers
/// of the public record consume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePage {
    pub senders: Vec<PublicKey>,
    pub timestamps: Vec<u64>,
    pub payloads: Vec<Vec<u8>>,
}

impl MessagePage {
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.senders.len(), self.timestamps.len());
        debug_assert_eq!(self.senders.len(), self.payloads.len());
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Operations the protocol needs from the shared record
///
/// Each mutation corresponds to one ledger transaction: atomic, totally
/// ordered relative to all others, with no partial effect on failure. Queries
/// are pure reads of current state.
#[async_trait]
pub trait NetLedger: Send + Sync + Debug + Clone + 'static {
    type Error: Display + Debug;

    /// Number of nets ever created; also the next id to be assigned
    async fn net_count(&self) -> Result<u64, NetLedgerError<Self::Error>>;

    /// Create a net with `creator` as its sole member
    ///
    /// The caller must already have produced `handle` through the key gate;
    /// no net may exist without a reachable secret.
    ///
    /// # Errors
    ///
    /// * `EmptyName` if `name` is empty
    async fn create_net(
        &self,
        creator: PublicKey,
        name: String,
        handle: SecretHandle,
    ) -> Result<NetId, NetLedgerError<Self::Error>>;

    /// Add `member` to the net's membership relation
    ///
    /// Membership is monotonic: once granted it is never revoked.
    ///
    /// # Errors
    ///
    /// * `UnknownNet` if `net_id` is out of range
    /// * `AlreadyMember` on a repeat join
    async fn join_net(
        &self,
        member: PublicKey,
        net_id: NetId,
    ) -> Result<(), NetLedgerError<Self::Error>>;

    /// Append an encrypted payload to the net's message log
    ///
    /// # Errors
    ///
    /// * `UnknownNet` if `net_id` is out of range
    /// * `NotMember` if `sender` has not joined
    /// * `EmptyMessage` if `payload` is zero-length
    async fn send_message(
        &self,
        sender: PublicKey,
        net_id: NetId,
        payload: Vec<u8>,
    ) -> Result<(), NetLedgerError<Self::Error>>;

    /// Get a net's public metadata
    async fn net_info(&self, net_id: NetId) -> Result<NetInfo, NetLedgerError<Self::Error>>;

    /// Whether `identity` is a member of the net
    async fn is_member(
        &self,
        net_id: NetId,
        identity: PublicKey,
    ) -> Result<bool, NetLedgerError<Self::Error>>;

    /// The net's encrypted-secret handle
    async fn encrypted_key_handle(
        &self,
        net_id: NetId,
    ) -> Result<SecretHandle, NetLedgerError<Self::Error>>;

    /// Length of the net's message log
    async fn message_count(&self, net_id: NetId) -> Result<u64, NetLedgerError<Self::Error>>;

    /// A contiguous slice of the log starting at `start`, at most `limit` entries
    ///
    /// Returns fewer entries near the tail and an empty page past the end.
    async fn messages(
        &self,
        net_id: NetId,
        start: u64,
        limit: u64,
    ) -> Result<MessagePage, NetLedgerError<Self::Error>>;
}
