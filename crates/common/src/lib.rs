/**
 * Client synchronization layer.
 *  Owns a member's identity, talks to the ledger
 *  and the key gate, and keeps the client-local
 *  caches of decrypted secrets and plaintext.
 */
pub mod client;
/**
 * Cryptographic types and operations.
 *  - Identity keypairs and signatures
 *  - Shared-secret key derivation
 *  - Message envelope encryption
 *  - Sealed-secret handshake responses
 */
pub mod crypto;
/**
 * The confidential secret distribution gate.
 *  Capability interface over the coprocessor that
 *  stores each net's encrypted shared secret and
 *  enforces who may obtain its plaintext.
 */
pub mod gate;
/**
 * The net registry ledger.
 *  Append-only public record of nets, memberships
 *  and message envelopes, with signed transaction
 *  submission.
 */
pub mod ledger;
/**
 * In-memory wiring helpers for integration tests.
 */
pub mod testkit;
/**
 * Helper exposing build version information.
 */
pub mod version;

pub mod prelude {
    pub use crate::client::Client;
    pub use crate::crypto::{PublicKey, SecretKey, SharedSecret};
    pub use crate::gate::{KeyGate, MemoryKeyGate};
    pub use crate::ledger::{MemoryNetLedger, NetId, NetLedger};
    pub use crate::version::build_info;
}
