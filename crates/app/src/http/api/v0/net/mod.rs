use axum::routing::post;
use axum::Router;
use http::StatusCode;

use common::gate::{KeyGateError, MemoryKeyGateError};
use common::ledger::{MemoryNetLedgerError, NetLedgerError};
use service::ServiceState;

pub mod create;
pub mod decrypt_key;
pub mod handle;
pub mod join;
pub mod list;
pub mod messages;
pub mod send;

// Re-export for convenience
pub use create::CreateRequest;
pub use decrypt_key::DecryptKeyRequest;
pub use handle::HandleRequest;
pub use join::JoinRequest;
pub use list::ListRequest;
pub use messages::MessagesRequest;
pub use send::SendRequest;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/create", post(create::handler))
        .route("/list", post(list::handler))
        .route("/join", post(join::handler))
        .route("/send", post(send::handler))
        .route("/messages", post(messages::handler))
        .route("/handle", post(handle::handler))
        .route("/decrypt-key", post(decrypt_key::handler))
        .with_state(state)
}

/// Ledger errors as the daemon's concrete provider produces them
pub(crate) type LedgerError = NetLedgerError<MemoryNetLedgerError>;
/// Gate errors as the daemon's concrete provider produces them
pub(crate) type GateError = KeyGateError<MemoryKeyGateError>;

/// Map the ledger's structured rejections onto HTTP statuses
///
/// Validation is 400, authorization 403, unknown targets 404; only backend
/// faults become 500 so callers can always tell which recovery applies.
pub(crate) fn ledger_status(err: &LedgerError) -> StatusCode {
    match err {
        NetLedgerError::UnknownNet(_) => StatusCode::NOT_FOUND,
        NetLedgerError::NotMember(_) => StatusCode::FORBIDDEN,
        NetLedgerError::AlreadyMember(_) => StatusCode::CONFLICT,
        NetLedgerError::EmptyName | NetLedgerError::EmptyMessage => StatusCode::BAD_REQUEST,
        NetLedgerError::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Map the gate's rejections onto HTTP statuses
pub(crate) fn gate_status(err: &GateError) -> StatusCode {
    match err {
        KeyGateError::UnknownHandle(_) => StatusCode::NOT_FOUND,
        KeyGateError::InvalidProof => StatusCode::BAD_REQUEST,
        KeyGateError::AccessDenied => StatusCode::FORBIDDEN,
        KeyGateError::ProofExpired { .. } => StatusCode::GONE,
        KeyGateError::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn now_unix() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

pub(crate) fn parse_public_key(hex_str: &str) -> Result<common::crypto::PublicKey, String> {
    common::crypto::PublicKey::from_hex(hex_str).map_err(|e| format!("public key: {}", e))
}

pub(crate) fn parse_signature(hex_str: &str) -> Result<common::crypto::Signature, String> {
    let bytes = hex::decode(hex_str.trim_start_matches("0x"))
        .map_err(|e| format!("signature: {}", e))?;
    let bytes: &[u8; 64] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| "signature must be 64 bytes".to_string())?;
    Ok(common::crypto::Signature::from_bytes(bytes))
}

pub(crate) fn parse_hex(label: &str, hex_str: &str) -> Result<Vec<u8>, String> {
    common::crypto::hex_to_bytes(hex_str).map_err(|e| format!("{}: {}", label, e))
}

/// Failures from applying a verified submission to the record
///
/// Wraps whichever side of a gate/ledger bundle rejected, keeping the
/// distinguishing reason for the status mapping.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("{0}")]
    Ledger(#[from] LedgerError),
    #[error("{0}")]
    Gate(#[from] GateError),
}

impl From<common::client::BundleError<MemoryNetLedgerError, MemoryKeyGateError>> for SubmitError {
    fn from(err: common::client::BundleError<MemoryNetLedgerError, MemoryKeyGateError>) -> Self {
        match err {
            common::client::BundleError::Ledger(e) => SubmitError::Ledger(e),
            common::client::BundleError::Gate(e) => SubmitError::Gate(e),
        }
    }
}

impl axum::response::IntoResponse for SubmitError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            SubmitError::Ledger(err) => ledger_status(err),
            SubmitError::Gate(err) => gate_status(err),
        };
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Unexpected error".to_string()
        } else {
            self.to_string()
        };
        (status, message).into_response()
    }
}
