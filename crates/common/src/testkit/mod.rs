//! Wiring helpers for integration tests
//!
//! A [`TestNetwork`] is one shared record plus one key gate; every
//! [`TestMember`] minted from it gets its own identity and its own
//! [`Client`] over cloned provider handles, so multi-member scenarios run
//! in-process against genuinely shared state.

use crate::client::Client;
use crate::crypto::{PublicKey, SecretKey};
use crate::gate::MemoryKeyGate;
use crate::ledger::MemoryNetLedger;

/// A shared in-memory record and gate for a test scenario
#[derive(Debug, Clone, Default)]
pub struct TestNetwork {
    ledger: MemoryNetLedger,
    gate: MemoryKeyGate,
}

/// One member with its own identity and client
pub struct TestMember {
    /// The name of this member (for debugging)
    pub name: String,
    /// Identity keypair for this member
    pub key: SecretKey,
    /// Client over the network's shared providers
    pub client: Client<MemoryNetLedger, MemoryKeyGate>,
}

impl TestNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct handle on the shared ledger, for assertions
    pub fn ledger(&self) -> &MemoryNetLedger {
        &self.ledger
    }

    /// Direct handle on the shared gate, for assertions
    pub fn gate(&self) -> &MemoryKeyGate {
        &self.gate
    }

    /// Mint a member with a fresh random identity
    pub fn member(&self, name: impl Into<String>) -> TestMember {
        self.member_with_key(name, SecretKey::generate())
    }

    /// Mint a member with a specific identity key
    pub fn member_with_key(&self, name: impl Into<String>, key: SecretKey) -> TestMember {
        TestMember {
            name: name.into(),
            key: key.clone(),
            client: Client::new(self.ledger.clone(), self.gate.clone(), key),
        }
    }
}

impl TestMember {
    /// This member's public identity
    pub fn identity(&self) -> PublicKey {
        self.key.public()
    }
}
