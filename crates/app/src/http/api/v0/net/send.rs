use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::ledger::{NetLedger, SignedTransaction, Transaction};

use crate::http::api::client::ApiRequest;
use service::ServiceState;

/// Append an encrypted payload to a net's message log
///
/// The payload arrives already encrypted; the daemon never sees message
/// plaintext. Membership and the non-empty check are enforced by the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendRequest {
    /// Caller identity (hex-encoded public key)
    pub caller: String,
    /// Net id to send to
    pub net_id: u64,
    /// Encrypted envelope, "0x"-prefixed hex
    pub payload: String,
    /// Transaction signature, hex-encoded
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendResponse {
    pub net_id: u64,
    pub message_count: u64,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<SendRequest>,
) -> Result<impl IntoResponse, SendError> {
    let caller = super::parse_public_key(&req.caller).map_err(SendError::InvalidRequest)?;
    let signature = super::parse_signature(&req.signature).map_err(SendError::InvalidRequest)?;
    let payload = super::parse_hex("payload", &req.payload).map_err(SendError::InvalidRequest)?;

    let signed = SignedTransaction {
        caller,
        tx: Transaction::SendMessage {
            net_id: req.net_id,
            payload: payload.clone(),
        },
        signature,
    };
    signed.verify().map_err(|_| SendError::BadSignature)?;

    state
        .ledger()
        .send_message(caller, req.net_id, payload)
        .await
        .map_err(super::SubmitError::from)?;

    // confirm the append is visible before reporting success
    let message_count = state
        .ledger()
        .message_count(req.net_id)
        .await
        .map_err(super::SubmitError::from)?;

    tracing::info!("{} sent message to net {}", caller, req.net_id);

    Ok(Json(SendResponse {
        net_id: req.net_id,
        message_count,
    }))
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("transaction signature does not verify")]
    BadSignature,
    #[error("submission failed: {0}")]
    Submit(#[from] super::SubmitError),
}

impl IntoResponse for SendError {
    fn into_response(self) -> Response {
        match self {
            SendError::InvalidRequest(msg) => (http::StatusCode::BAD_REQUEST, msg).into_response(),
            SendError::BadSignature => {
                (http::StatusCode::UNAUTHORIZED, self.to_string()).into_response()
            }
            SendError::Submit(err) => err.into_response(),
        }
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for SendRequest {
    type Response = SendResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/net/send").unwrap();
        client.post(full_url).json(&self)
    }
}

impl SendRequest {
    /// Build and sign a send submission with the caller's identity key
    pub fn sign(net_id: u64, payload: &[u8], caller: &common::crypto::SecretKey) -> Self {
        let signed = SignedTransaction::sign(
            Transaction::SendMessage {
                net_id,
                payload: payload.to_vec(),
            },
            caller,
        );
        Self {
            caller: caller.public().to_hex(),
            net_id,
            payload: common::crypto::bytes_to_hex(payload),
            signature: hex::encode(signed.signature.to_bytes()),
        }
    }
}
