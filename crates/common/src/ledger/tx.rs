//! Signed ledger submissions
//!
//! Mutations reach the shared record as transactions signed by the caller's
//! identity key. The daemon verifies the signature against the claimed caller
//! before applying anything, so a submission cannot be forged or altered in
//! flight. Queries are unsigned: the record is public.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::crypto::{PublicKey, SecretKey, SharedSecret, Signature};

use super::provider::NetId;

const CREATE_NET_DOMAIN: &[u8] = b"shroudnet.tx.create-net.v1";
const JOIN_NET_DOMAIN: &[u8] = b"shroudnet.tx.join-net.v1";
const SEND_MESSAGE_DOMAIN: &[u8] = b"shroudnet.tx.send-message.v1";

/// Errors that can occur while verifying a signed submission
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TransactionError {
    /// The signature does not verify for the claimed caller
    #[error("invalid transaction signature")]
    InvalidSignature,
}

/// One state-changing ledger operation
///
/// `CreateNet` commits to a digest of the shared secret rather than the gate
/// handle: the handle is assigned server-side during the atomic
/// submit-then-create bundle, so the caller cannot know it at signing time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transaction {
    CreateNet {
        name: String,
        /// SHA-256 of the shared secret submitted alongside this transaction
        secret_digest: [u8; 32],
    },
    JoinNet {
        net_id: NetId,
    },
    SendMessage {
        net_id: NetId,
        payload: Vec<u8>,
    },
}

impl Transaction {
    /// Build the create-net transaction for a secret about to be submitted
    pub fn create_net(name: String, secret: &SharedSecret) -> Self {
        let digest = Sha256::digest(secret.bytes());
        let mut secret_digest = [0u8; 32];
        secret_digest.copy_from_slice(&digest);
        Transaction::CreateNet {
            name,
            secret_digest,
        }
    }

    /// The canonical byte encoding covered by the caller's signature
    pub fn to_signing_bytes(&self) -> Vec<u8> {
        match self {
            Transaction::CreateNet {
                name,
                secret_digest,
            } => {
                let name_bytes = name.as_bytes();
                let mut msg =
                    Vec::with_capacity(CREATE_NET_DOMAIN.len() + 4 + name_bytes.len() + 32);
                msg.extend_from_slice(CREATE_NET_DOMAIN);
                msg.extend_from_slice(&(name_bytes.len() as u32).to_be_bytes());
                msg.extend_from_slice(name_bytes);
                msg.extend_from_slice(secret_digest);
                msg
            }
            Transaction::JoinNet { net_id } => {
                let mut msg = Vec::with_capacity(JOIN_NET_DOMAIN.len() + 8);
                msg.extend_from_slice(JOIN_NET_DOMAIN);
                msg.extend_from_slice(&net_id.to_be_bytes());
                msg
            }
            Transaction::SendMessage { net_id, payload } => {
                let mut msg =
                    Vec::with_capacity(SEND_MESSAGE_DOMAIN.len() + 8 + payload.len());
                msg.extend_from_slice(SEND_MESSAGE_DOMAIN);
                msg.extend_from_slice(&net_id.to_be_bytes());
                msg.extend_from_slice(payload);
                msg
            }
        }
    }

}

/// A transaction plus the caller's identity and signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub caller: PublicKey,
    pub tx: Transaction,
    pub signature: Signature,
}

impl SignedTransaction {
    /// Sign `tx` with the caller's identity key
    pub fn sign(tx: Transaction, caller: &SecretKey) -> Self {
        let signature = caller.sign(&tx.to_signing_bytes());
        Self {
            caller: caller.public(),
            tx,
            signature,
        }
    }

    /// Verify the signature against the claimed caller
    pub fn verify(&self) -> Result<(), TransactionError> {
        self.caller
            .verify(&self.tx.to_signing_bytes(), &self.signature)
            .map_err(|_| TransactionError::InvalidSignature)
    }
}
