//! ShroudNet daemon and CLI
//!
//! The binary wears two hats:
//!
//! - `shroud serve` hosts the shared record: the net ledger, the key gate, and
//!   the signed-submission HTTP API.
//! - every other subcommand is a member client that signs submissions with the
//!   local identity key and talks to a daemon over that API.

pub mod commands;
pub mod http;
pub mod identity;
pub mod serve;
