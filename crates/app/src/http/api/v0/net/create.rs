use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::client::ops;
use common::crypto::SharedSecret;
use common::gate::InputProof;
use common::ledger::{NetLedger, SignedTransaction, Transaction};

use crate::http::api::client::ApiRequest;
use service::ServiceState;

/// Create a net, bundling the gate submission and the ledger record
///
/// The caller signs over the name and a digest of the secret; the daemon
/// verifies the transaction, submits the secret to the gate under the caller's
/// binding proof, and creates the net bound to the returned handle. From the
/// caller's point of view it is one atomic submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRequest {
    /// Caller identity (hex-encoded public key)
    pub caller: String,
    /// Net display name
    pub name: String,
    /// The shared secret, "0x"-prefixed hex (20 bytes)
    pub secret: String,
    /// Gate binding proof, hex-encoded, opaque to the ledger
    pub input_proof: String,
    /// Transaction signature, hex-encoded
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateResponse {
    pub net_id: u64,
    pub handle: String,
    pub name: String,
    pub member_count: u32,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<CreateRequest>,
) -> Result<impl IntoResponse, CreateError> {
    let caller = super::parse_public_key(&req.caller).map_err(CreateError::InvalidRequest)?;
    let secret = SharedSecret::from_hex(&req.secret)
        .map_err(|e| CreateError::InvalidRequest(format!("secret: {}", e)))?;
    let signature = super::parse_signature(&req.signature).map_err(CreateError::InvalidRequest)?;
    let proof =
        super::parse_hex("input proof", &req.input_proof).map_err(CreateError::InvalidRequest)?;

    // The signature covers the name and a commitment to the secret
    let tx = Transaction::create_net(req.name.clone(), &secret);
    let signed = SignedTransaction {
        caller,
        tx,
        signature,
    };
    signed.verify().map_err(|_| CreateError::BadSignature)?;

    let (net_id, handle) = ops::create_net(
        state.ledger(),
        state.gate(),
        caller,
        req.name,
        secret,
        InputProof::from(proof),
    )
    .await
    .map_err(super::SubmitError::from)?;

    // surface the state the submission produced, not the request
    let info = state
        .ledger()
        .net_info(net_id)
        .await
        .map_err(super::SubmitError::from)?;

    tracing::info!("created net {} ({}) for {}", net_id, info.name, caller);

    Ok(Json(CreateResponse {
        net_id,
        handle: handle.to_hex(),
        name: info.name,
        member_count: info.member_count,
    }))
}

#[derive(Debug, thiserror::Error)]
pub enum CreateError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("transaction signature does not verify")]
    BadSignature,
    #[error("submission failed: {0}")]
    Submit(#[from] super::SubmitError),
}

impl IntoResponse for CreateError {
    fn into_response(self) -> Response {
        match self {
            CreateError::InvalidRequest(msg) => {
                (http::StatusCode::BAD_REQUEST, msg).into_response()
            }
            CreateError::BadSignature => {
                (http::StatusCode::UNAUTHORIZED, self.to_string()).into_response()
            }
            CreateError::Submit(err) => err.into_response(),
        }
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for CreateRequest {
    type Response = CreateResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/net/create").unwrap();
        client.post(full_url).json(&self)
    }
}

impl CreateRequest {
    /// Build and sign a create submission with the caller's identity key
    pub fn sign(
        name: String,
        secret: &SharedSecret,
        caller: &common::crypto::SecretKey,
    ) -> Self {
        let tx = Transaction::create_net(name.clone(), secret);
        let signed = SignedTransaction::sign(tx, caller);
        let proof = InputProof::bind(secret, caller);
        Self {
            caller: caller.public().to_hex(),
            name,
            secret: secret.to_hex(),
            input_proof: hex::encode(proof.bytes()),
            signature: hex::encode(signed.signature.to_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::crypto::SecretKey;
    use service::Config;

    #[tokio::test]
    async fn test_create_and_reject_bad_signature() {
        let state = ServiceState::from_config(&Config::default()).unwrap();
        let alice = SecretKey::generate();
        let secret = SharedSecret::generate();

        let req = CreateRequest::sign("Test Net".to_string(), &secret, &alice);
        let response = handler(State(state.clone()), Json(req.clone()))
            .await
            .unwrap()
            .into_response();
        assert_eq!(response.status(), http::StatusCode::OK);

        // tampering with the name breaks the signature
        let mut tampered = req;
        tampered.name = "Other".to_string();
        let result = handler(State(state), Json(tampered)).await;
        assert!(matches!(result, Err(CreateError::BadSignature)));
    }
}
