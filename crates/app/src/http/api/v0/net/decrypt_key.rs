use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::gate::{
    AuthorizationProof, DecryptionRequest, KeyGate, SecretHandle, ValidityWindow,
};

use crate::http::api::client::ApiRequest;
use service::ServiceState;

/// Run the authorization handshake against the gate
///
/// The request carries a freshly signed proof naming the handle, the claimed
/// identity, the ephemeral session key, and the validity window. On success
/// the response carries the secret sealed to that session key; plaintext
/// never crosses the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptKeyRequest {
    /// The handle whose plaintext is requested, "0x"-prefixed hex
    pub handle: String,
    /// Requesting identity (hex-encoded public key)
    pub identity: String,
    /// Ephemeral session public key the response is sealed to (hex)
    pub session_key: String,
    /// Unix seconds the proof was issued at
    pub issued_at: u64,
    /// Seconds the proof stays valid
    pub duration_secs: u64,
    /// Proof signature by the requesting identity, hex-encoded
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptKeyResponse {
    /// The sealed secret, hex-encoded
    pub sealed: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<DecryptKeyRequest>,
) -> Result<impl IntoResponse, DecryptKeyError> {
    let handle = SecretHandle::from_hex(&req.handle)
        .map_err(|e| DecryptKeyError::InvalidRequest(format!("handle: {}", e)))?;
    let identity =
        super::parse_public_key(&req.identity).map_err(DecryptKeyError::InvalidRequest)?;
    let session_key =
        super::parse_public_key(&req.session_key).map_err(DecryptKeyError::InvalidRequest)?;
    let signature =
        super::parse_signature(&req.signature).map_err(DecryptKeyError::InvalidRequest)?;

    let proof = AuthorizationProof {
        request: DecryptionRequest {
            handle,
            identity,
            session_key,
            window: ValidityWindow::new(req.issued_at, req.duration_secs),
        },
        signature,
    };

    let sealed = state
        .gate()
        .authorize_and_decrypt(&proof, super::now_unix())
        .await
        .map_err(super::SubmitError::from)?;

    tracing::debug!("handshake released {} to {}", handle, identity);

    Ok(Json(DecryptKeyResponse {
        sealed: sealed.to_hex(),
    }))
}

#[derive(Debug, thiserror::Error)]
pub enum DecryptKeyError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("handshake failed: {0}")]
    Handshake(#[from] super::SubmitError),
}

impl IntoResponse for DecryptKeyError {
    fn into_response(self) -> Response {
        match self {
            DecryptKeyError::InvalidRequest(msg) => {
                (http::StatusCode::BAD_REQUEST, msg).into_response()
            }
            DecryptKeyError::Handshake(err) => err.into_response(),
        }
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for DecryptKeyRequest {
    type Response = DecryptKeyResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/net/decrypt-key").unwrap();
        client.post(full_url).json(&self)
    }
}

impl DecryptKeyRequest {
    /// Build a freshly signed handshake request from a proof
    pub fn from_proof(proof: &AuthorizationProof) -> Self {
        Self {
            handle: proof.request.handle.to_hex(),
            identity: proof.request.identity.to_hex(),
            session_key: proof.request.session_key.to_hex(),
            issued_at: proof.request.window.issued_at,
            duration_secs: proof.request.window.duration_secs,
            signature: hex::encode(proof.signature.to_bytes()),
        }
    }
}
