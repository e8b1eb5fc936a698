use std::collections::HashMap;

use crate::crypto::SharedSecret;
use crate::ledger::NetId;

/// Client-local cache of recovered secrets and message plaintext
///
/// Both maps hold material that must never reach the shared record. Secrets
/// survive for the client's lifetime (re-derived per session, never persisted);
/// message plaintext is dropped for a net whenever that net's log is reloaded,
/// so stale indices can never show another message's text.
#[derive(Debug, Default)]
pub struct PlaintextCache {
    /// Recovered shared secrets by net
    secrets: HashMap<NetId, SharedSecret>,
    /// Decrypted message text by net and log index
    messages: HashMap<NetId, HashMap<u64, String>>,
}

impl PlaintextCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached shared secret for a net, if the handshake ran this session
    pub fn secret(&self, net_id: NetId) -> Option<&SharedSecret> {
        self.secrets.get(&net_id)
    }

    /// Cache a freshly recovered shared secret
    pub fn put_secret(&mut self, net_id: NetId, secret: SharedSecret) {
        self.secrets.insert(net_id, secret);
    }

    /// The cached plaintext for one message, if already decrypted
    pub fn message(&self, net_id: NetId, index: u64) -> Option<&String> {
        self.messages.get(&net_id).and_then(|m| m.get(&index))
    }

    /// Cache the plaintext of one decrypted message
    pub fn put_message(&mut self, net_id: NetId, index: u64, plaintext: String) {
        self.messages.entry(net_id).or_default().insert(index, plaintext);
    }

    /// Drop all message plaintext for a net
    ///
    /// Called on every log reload for that net. The shared secret stays cached;
    /// it does not change across reloads.
    pub fn invalidate_messages(&mut self, net_id: NetId) {
        self.messages.remove(&net_id);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_invalidation_is_per_net() {
        let mut cache = PlaintextCache::new();
        cache.put_secret(0, SharedSecret::generate());
        cache.put_message(0, 0, "one".to_string());
        cache.put_message(0, 1, "two".to_string());
        cache.put_message(7, 0, "other net".to_string());

        cache.invalidate_messages(0);

        // net 0 plaintext is gone, its secret and net 7 untouched
        assert!(cache.message(0, 0).is_none());
        assert!(cache.message(0, 1).is_none());
        assert!(cache.secret(0).is_some());
        assert_eq!(cache.message(7, 0).unwrap(), "other net");
    }
}
