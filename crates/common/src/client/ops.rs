//! Two-phase gate/ledger bundles
//!
//! Creating or joining a net touches both the key gate and the ledger. The
//! original record applies both effects in one transaction; here the pairing
//! is an explicit two-phase protocol with a documented failure story, shared
//! by the in-process [`Client`](super::Client) and the daemon's submission
//! handlers so no call site can get the order wrong.
//!
//! - **Create** runs gate-first: `submit_secret`, then `create_net` binding
//!   the returned handle. If the ledger phase fails, the orphaned handle is
//!   referenced by nothing and grants nothing beyond what its creator already
//!   holds: harmless, no rollback needed.
//! - **Join** runs ledger-first: `join_net` is the authoritative membership
//!   check (unknown net, repeat join), then `extend_access`. A failed
//!   extension leaves a member temporarily unable to decrypt (recoverable,
//!   since extension is idempotent) but never a non-member holding access.

use crate::crypto::{PublicKey, SharedSecret};
use crate::gate::{InputProof, KeyGate, KeyGateError, SecretHandle};
use crate::ledger::{NetId, NetLedger, NetLedgerError};

/// Failures from a two-phase bundle, keeping the originating side visible
#[derive(Debug, thiserror::Error)]
pub enum BundleError<LE, GE>
where
    LE: std::fmt::Display + std::fmt::Debug,
    GE: std::fmt::Display + std::fmt::Debug,
{
    #[error("ledger error: {0}")]
    Ledger(#[from] NetLedgerError<LE>),
    #[error("key gate error: {0}")]
    Gate(#[from] KeyGateError<GE>),
}

/// Submit a secret to the gate, then create the net that binds its handle
pub async fn create_net<L, G>(
    ledger: &L,
    gate: &G,
    creator: PublicKey,
    name: String,
    secret: SharedSecret,
    proof: InputProof,
) -> Result<(NetId, SecretHandle), BundleError<L::Error, G::Error>>
where
    L: NetLedger,
    G: KeyGate,
{
    let handle = gate.submit_secret(secret, creator, proof).await?;
    let net_id = ledger.create_net(creator, name, handle).await?;
    tracing::debug!("bundled create: net {} bound to {}", net_id, handle);
    Ok((net_id, handle))
}

/// Join a net on the ledger, then extend the gate's access list to the joiner
pub async fn join_net<L, G>(
    ledger: &L,
    gate: &G,
    member: PublicKey,
    net_id: NetId,
) -> Result<(), BundleError<L::Error, G::Error>>
where
    L: NetLedger,
    G: KeyGate,
{
    ledger.join_net(member, net_id).await?;
    let handle = ledger.encrypted_key_handle(net_id).await?;
    gate.extend_access(handle, member).await?;
    tracing::debug!("bundled join: {} onto net {}", member, net_id);
    Ok(())
}
