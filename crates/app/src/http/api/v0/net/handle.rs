use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::ledger::NetLedger;

use crate::http::api::client::ApiRequest;
use service::ServiceState;

/// Read a net's encrypted-secret handle
///
/// The handle is public record data; only the gate handshake turns it into a
/// secret, and only for identities on its access list.
#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct HandleRequest {
    /// Net id to read
    #[arg(long)]
    pub net_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandleResponse {
    pub net_id: u64,
    pub handle: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<HandleRequest>,
) -> Result<impl IntoResponse, HandleError> {
    let handle = state
        .ledger()
        .encrypted_key_handle(req.net_id)
        .await
        .map_err(super::SubmitError::from)?;

    Ok(Json(HandleResponse {
        net_id: req.net_id,
        handle: handle.to_hex(),
    }))
}

#[derive(Debug, thiserror::Error)]
pub enum HandleError {
    #[error("query failed: {0}")]
    Query(#[from] super::SubmitError),
}

impl IntoResponse for HandleError {
    fn into_response(self) -> Response {
        match self {
            HandleError::Query(err) => err.into_response(),
        }
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for HandleRequest {
    type Response = HandleResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/net/handle").unwrap();
        client.post(full_url).json(&self)
    }
}
