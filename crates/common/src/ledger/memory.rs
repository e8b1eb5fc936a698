use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use crate::crypto::PublicKey;
use crate::gate::SecretHandle;

use super::provider::{MessagePage, NetId, NetInfo, NetLedger, NetLedgerError};

/// In-memory net ledger
///
/// Models the linearizable shared record: one lock around all state, so every
/// mutation is atomic and totally ordered relative to all others regardless of
/// how many concurrent submitters there are.
#[derive(Debug, Clone)]
pub struct MemoryNetLedger {
    inner: Arc<RwLock<MemoryNetLedgerInner>>,
}

#[derive(Debug, Default)]
struct MemoryNetLedgerInner {
    /// Net records in creation order; the index is the net id
    nets: Vec<NetRecord>,
}

#[derive(Debug)]
struct NetRecord {
    name: String,
    creator: PublicKey,
    created_at: u64,
    handle: SecretHandle,
    /// Hex-encoded member identities; monotonic
    members: BTreeSet<String>,
    /// Append-only message log
    messages: Vec<StoredMessage>,
}

#[derive(Debug)]
struct StoredMessage {
    sender: PublicKey,
    timestamp: u64,
    payload: Vec<u8>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryNetLedgerError {
    #[error("memory ledger error: {0}")]
    Internal(String),
}

fn now_unix() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

impl MemoryNetLedger {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryNetLedgerInner::default())),
        }
    }
}

impl Default for MemoryNetLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryNetLedgerInner {
    fn net(&self, net_id: NetId) -> Result<&NetRecord, NetLedgerError<MemoryNetLedgerError>> {
        self.nets
            .get(net_id as usize)
            .ok_or(NetLedgerError::UnknownNet(net_id))
    }

    fn net_mut(
        &mut self,
        net_id: NetId,
    ) -> Result<&mut NetRecord, NetLedgerError<MemoryNetLedgerError>> {
        self.nets
            .get_mut(net_id as usize)
            .ok_or(NetLedgerError::UnknownNet(net_id))
    }
}

#[async_trait]
impl NetLedger for MemoryNetLedger {
    type Error = MemoryNetLedgerError;

    async fn net_count(&self) -> Result<u64, NetLedgerError<Self::Error>> {
        let inner = self.read()?;
        Ok(inner.nets.len() as u64)
    }

    async fn create_net(
        &self,
        creator: PublicKey,
        name: String,
        handle: SecretHandle,
    ) -> Result<NetId, NetLedgerError<Self::Error>> {
        if name.is_empty() {
            return Err(NetLedgerError::EmptyName);
        }

        let mut inner = self.write()?;
        let net_id = inner.nets.len() as NetId;
        inner.nets.push(NetRecord {
            name,
            creator,
            created_at: now_unix(),
            handle,
            members: BTreeSet::from([creator.to_hex()]),
            messages: Vec::new(),
        });

        tracing::debug!("created net {} by {}", net_id, creator);
        Ok(net_id)
    }

    async fn join_net(
        &self,
        member: PublicKey,
        net_id: NetId,
    ) -> Result<(), NetLedgerError<Self::Error>> {
        let mut inner = self.write()?;
        let net = inner.net_mut(net_id)?;

        if !net.members.insert(member.to_hex()) {
            return Err(NetLedgerError::AlreadyMember(net_id));
        }

        tracing::debug!("{} joined net {}", member, net_id);
        Ok(())
    }

    async fn send_message(
        &self,
        sender: PublicKey,
        net_id: NetId,
        payload: Vec<u8>,
    ) -> Result<(), NetLedgerError<Self::Error>> {
        if payload.is_empty() {
            return Err(NetLedgerError::EmptyMessage);
        }

        let mut inner = self.write()?;
        let net = inner.net_mut(net_id)?;

        if !net.members.contains(&sender.to_hex()) {
            return Err(NetLedgerError::NotMember(net_id));
        }

        net.messages.push(StoredMessage {
            sender,
            timestamp: now_unix(),
            payload,
        });

        tracing::debug!(
            "{} appended message {} to net {}",
            sender,
            net.messages.len() - 1,
            net_id
        );
        Ok(())
    }

    async fn net_info(&self, net_id: NetId) -> Result<NetInfo, NetLedgerError<Self::Error>> {
        let inner = self.read()?;
        let net = inner.net(net_id)?;
        Ok(NetInfo {
            name: net.name.clone(),
            creator: net.creator,
            created_at: net.created_at,
            member_count: net.members.len() as u32,
        })
    }

    async fn is_member(
        &self,
        net_id: NetId,
        identity: PublicKey,
    ) -> Result<bool, NetLedgerError<Self::Error>> {
        let inner = self.read()?;
        let net = inner.net(net_id)?;
        Ok(net.members.contains(&identity.to_hex()))
    }

    async fn encrypted_key_handle(
        &self,
        net_id: NetId,
    ) -> Result<SecretHandle, NetLedgerError<Self::Error>> {
        let inner = self.read()?;
        let net = inner.net(net_id)?;
        Ok(net.handle)
    }

    async fn message_count(&self, net_id: NetId) -> Result<u64, NetLedgerError<Self::Error>> {
        let inner = self.read()?;
        let net = inner.net(net_id)?;
        Ok(net.messages.len() as u64)
    }

    async fn messages(
        &self,
        net_id: NetId,
        start: u64,
        limit: u64,
    ) -> Result<MessagePage, NetLedgerError<Self::Error>> {
        let inner = self.read()?;
        let net = inner.net(net_id)?;

        let len = net.messages.len() as u64;
        let start = start.min(len) as usize;
        let end = (start as u64).saturating_add(limit).min(len) as usize;

        let mut page = MessagePage::default();
        for message in &net.messages[start..end] {
            page.senders.push(message.sender);
            page.timestamps.push(message.timestamp);
            page.payloads.push(message.payload.clone());
        }
        Ok(page)
    }
}

impl MemoryNetLedger {
    fn read(
        &self,
    ) -> Result<
        std::sync::RwLockReadGuard<'_, MemoryNetLedgerInner>,
        NetLedgerError<MemoryNetLedgerError>,
    > {
        self.inner.read().map_err(|e| {
            NetLedgerError::Provider(MemoryNetLedgerError::Internal(format!(
                "failed to acquire read lock: {}",
                e
            )))
        })
    }

    fn write(
        &self,
    ) -> Result<
        std::sync::RwLockWriteGuard<'_, MemoryNetLedgerInner>,
        NetLedgerError<MemoryNetLedgerError>,
    > {
        self.inner.write().map_err(|e| {
            NetLedgerError::Provider(MemoryNetLedgerError::Internal(format!(
                "failed to acquire write lock: {}",
                e
            )))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SecretKey;

    fn identity() -> PublicKey {
        SecretKey::generate().public()
    }

    #[tokio::test]
    async fn test_ids_are_sequential_from_zero() {
        let ledger = MemoryNetLedger::new();
        let creator = identity();

        assert_eq!(ledger.net_count().await.unwrap(), 0);
        for expected in 0..3u64 {
            let id = ledger
                .create_net(creator, format!("net-{}", expected), SecretHandle::generate())
                .await
                .unwrap();
            assert_eq!(id, expected);
        }
        assert_eq!(ledger.net_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let ledger = MemoryNetLedger::new();
        let result = ledger
            .create_net(identity(), String::new(), SecretHandle::generate())
            .await;
        assert!(matches!(result, Err(NetLedgerError::EmptyName)));
        assert_eq!(ledger.net_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_creator_is_sole_member() {
        let ledger = MemoryNetLedger::new();
        let creator = identity();
        let id = ledger
            .create_net(creator, "home".to_string(), SecretHandle::generate())
            .await
            .unwrap();

        let info = ledger.net_info(id).await.unwrap();
        assert_eq!(info.name, "home");
        assert_eq!(info.creator, creator);
        assert_eq!(info.member_count, 1);
        assert!(ledger.is_member(id, creator).await.unwrap());
        assert!(!ledger.is_member(id, identity()).await.unwrap());
    }

    #[tokio::test]
    async fn test_join_increments_member_count_once() {
        let ledger = MemoryNetLedger::new();
        let creator = identity();
        let joiner = identity();
        let id = ledger
            .create_net(creator, "home".to_string(), SecretHandle::generate())
            .await
            .unwrap();

        ledger.join_net(joiner, id).await.unwrap();
        assert_eq!(ledger.net_info(id).await.unwrap().member_count, 2);
        assert!(ledger.is_member(id, joiner).await.unwrap());

        // a repeat join is rejected and changes nothing
        let result = ledger.join_net(joiner, id).await;
        assert!(matches!(result, Err(NetLedgerError::AlreadyMember(i)) if i == id));
        assert_eq!(ledger.net_info(id).await.unwrap().member_count, 2);
    }

    #[tokio::test]
    async fn test_unknown_net() {
        let ledger = MemoryNetLedger::new();
        assert!(matches!(
            ledger.join_net(identity(), 7).await,
            Err(NetLedgerError::UnknownNet(7))
        ));
        assert!(matches!(
            ledger.net_info(0).await,
            Err(NetLedgerError::UnknownNet(0))
        ));
        assert!(matches!(
            ledger.messages(0, 0, 10).await,
            Err(NetLedgerError::UnknownNet(0))
        ));
    }

    #[tokio::test]
    async fn test_send_message_requires_membership_and_payload() {
        let ledger = MemoryNetLedger::new();
        let creator = identity();
        let outsider = identity();
        let id = ledger
            .create_net(creator, "home".to_string(), SecretHandle::generate())
            .await
            .unwrap();

        let result = ledger.send_message(outsider, id, vec![0x12, 0x34]).await;
        assert!(matches!(result, Err(NetLedgerError::NotMember(i)) if i == id));

        let result = ledger.send_message(creator, id, Vec::new()).await;
        assert!(matches!(result, Err(NetLedgerError::EmptyMessage)));
        assert_eq!(ledger.message_count(id).await.unwrap(), 0);

        ledger
            .send_message(creator, id, vec![0x12, 0x34])
            .await
            .unwrap();
        assert_eq!(ledger.message_count(id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_pagination() {
        let ledger = MemoryNetLedger::new();
        let creator = identity();
        let id = ledger
            .create_net(creator, "home".to_string(), SecretHandle::generate())
            .await
            .unwrap();

        // empty log
        assert!(ledger.messages(id, 0, 50).await.unwrap().is_empty());

        for i in 0..5u8 {
            ledger.send_message(creator, id, vec![i + 1]).await.unwrap();
        }

        let page = ledger.messages(id, 0, 50).await.unwrap();
        assert_eq!(page.len(), 5);
        assert_eq!(page.senders[0], creator);
        assert_eq!(page.payloads[4], vec![5]);

        // a window in the middle
        let page = ledger.messages(id, 1, 2).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page.payloads, vec![vec![2], vec![3]]);

        // shorter near the tail, empty past the end
        assert_eq!(ledger.messages(id, 4, 10).await.unwrap().len(), 1);
        assert!(ledger.messages(id, 5, 10).await.unwrap().is_empty());
        assert!(ledger.messages(id, 100, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_handle_is_bound_at_creation() {
        let ledger = MemoryNetLedger::new();
        let handle = SecretHandle::generate();
        let id = ledger
            .create_net(identity(), "home".to_string(), handle)
            .await
            .unwrap();
        assert_eq!(ledger.encrypted_key_handle(id).await.unwrap(), handle);
    }
}
