//! # Net Registry Ledger
//!
//! The authoritative record of nets, their members, and their message logs.
//! Everything here is public by design: names, creators, member sets,
//! timestamps, and encrypted message envelopes all live on the shared record.
//! Only payload *content* is protected, and that protection happens off the
//! record in [`crate::crypto`].
//!
//! The ledger itself (ordering, finality, replication) is an external
//! collaborator. [`NetLedger`] captures the operations the protocol needs from
//! it; [`MemoryNetLedger`] models a linearizable single-node record where every
//! mutation is atomic and totally ordered. [`tx`] adds the signed-submission
//! envelope verified at the boundary before anything is applied.

pub mod memory;
mod provider;
pub mod tx;

pub use memory::{MemoryNetLedger, MemoryNetLedgerError};
pub use provider::{MessagePage, NetId, NetInfo, NetLedger, NetLedgerError};
pub use tx::{SignedTransaction, Transaction};
