use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::ledger::NetLedger;

use crate::http::api::client::ApiRequest;
use service::ServiceState;

/// Read a page of a net's message log
#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct MessagesRequest {
    /// Net id to read
    #[arg(long)]
    pub net_id: u64,
    /// Log position to start from
    #[arg(long, default_value_t = 0)]
    pub start: u64,
    /// Maximum number of entries to return
    #[arg(long, default_value_t = 50)]
    pub limit: u64,
}

/// Parallel sequences of equal length, mirroring the record's query shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesResponse {
    pub net_id: u64,
    pub start: u64,
    pub senders: Vec<String>,
    pub timestamps: Vec<u64>,
    /// Encrypted envelopes, "0x"-prefixed hex
    pub payloads: Vec<String>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<MessagesRequest>,
) -> Result<impl IntoResponse, MessagesError> {
    let page = state
        .ledger()
        .messages(req.net_id, req.start, req.limit)
        .await
        .map_err(super::SubmitError::from)?;

    Ok(Json(MessagesResponse {
        net_id: req.net_id,
        start: req.start,
        senders: page.senders.iter().map(|s| s.to_hex()).collect(),
        timestamps: page.timestamps,
        payloads: page
            .payloads
            .iter()
            .map(|p| common::crypto::bytes_to_hex(p))
            .collect(),
    }))
}

#[derive(Debug, thiserror::Error)]
pub enum MessagesError {
    #[error("query failed: {0}")]
    Query(#[from] super::SubmitError),
}

impl IntoResponse for MessagesError {
    fn into_response(self) -> Response {
        match self {
            MessagesError::Query(err) => err.into_response(),
        }
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for MessagesRequest {
    type Response = MessagesResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/net/messages").unwrap();
        client.post(full_url).json(&self)
    }
}
