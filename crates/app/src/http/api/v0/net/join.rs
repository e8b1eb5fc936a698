use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::client::ops;
use common::ledger::{NetLedger, SignedTransaction, Transaction};

use crate::http::api::client::ApiRequest;
use service::ServiceState;

/// Join a net, bundling the membership grant and the gate access extension
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequest {
    /// Caller identity (hex-encoded public key)
    pub caller: String,
    /// Net id to join
    pub net_id: u64,
    /// Transaction signature, hex-encoded
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinResponse {
    pub net_id: u64,
    pub member_count: u32,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<JoinRequest>,
) -> Result<impl IntoResponse, JoinError> {
    let caller = super::parse_public_key(&req.caller).map_err(JoinError::InvalidRequest)?;
    let signature = super::parse_signature(&req.signature).map_err(JoinError::InvalidRequest)?;

    let signed = SignedTransaction {
        caller,
        tx: Transaction::JoinNet { net_id: req.net_id },
        signature,
    };
    signed.verify().map_err(|_| JoinError::BadSignature)?;

    ops::join_net(state.ledger(), state.gate(), caller, req.net_id)
        .await
        .map_err(super::SubmitError::from)?;

    // confirm the membership is visible before reporting success
    let info = state
        .ledger()
        .net_info(req.net_id)
        .await
        .map_err(super::SubmitError::from)?;

    tracing::info!("{} joined net {}", caller, req.net_id);

    Ok(Json(JoinResponse {
        net_id: req.net_id,
        member_count: info.member_count,
    }))
}

#[derive(Debug, thiserror::Error)]
pub enum JoinError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("transaction signature does not verify")]
    BadSignature,
    #[error("submission failed: {0}")]
    Submit(#[from] super::SubmitError),
}

impl IntoResponse for JoinError {
    fn into_response(self) -> Response {
        match self {
            JoinError::InvalidRequest(msg) => (http::StatusCode::BAD_REQUEST, msg).into_response(),
            JoinError::BadSignature => {
                (http::StatusCode::UNAUTHORIZED, self.to_string()).into_response()
            }
            JoinError::Submit(err) => err.into_response(),
        }
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for JoinRequest {
    type Response = JoinResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/net/join").unwrap();
        client.post(full_url).json(&self)
    }
}

impl JoinRequest {
    /// Build and sign a join submission with the caller's identity key
    pub fn sign(net_id: u64, caller: &common::crypto::SecretKey) -> Self {
        let signed = SignedTransaction::sign(Transaction::JoinNet { net_id }, caller);
        Self {
            caller: caller.public().to_hex(),
            net_id,
            signature: hex::encode(signed.signature.to_bytes()),
        }
    }
}
