use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::ledger::NetLedger;

use crate::http::api::client::ApiRequest;
use service::ServiceState;

/// List all nets on the record, length-first then record-by-record
#[derive(Debug, Clone, Default, Serialize, Deserialize, clap::Args)]
pub struct ListRequest {
    /// Optionally report membership for this identity (hex-encoded public key)
    #[arg(long)]
    pub identity: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetRow {
    pub net_id: u64,
    pub name: String,
    pub creator: String,
    pub created_at: u64,
    pub member_count: u32,
    /// Present only when the request named an identity
    pub is_member: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    pub nets: Vec<NetRow>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<ListRequest>,
) -> Result<impl IntoResponse, ListError> {
    let identity = req
        .identity
        .as_deref()
        .map(super::parse_public_key)
        .transpose()
        .map_err(ListError::InvalidRequest)?;

    let count = state
        .ledger()
        .net_count()
        .await
        .map_err(super::SubmitError::from)?;

    let mut nets = Vec::with_capacity(count as usize);
    for net_id in 0..count {
        let info = state
            .ledger()
            .net_info(net_id)
            .await
            .map_err(super::SubmitError::from)?;
        let is_member = match identity {
            Some(identity) => Some(
                state
                    .ledger()
                    .is_member(net_id, identity)
                    .await
                    .map_err(super::SubmitError::from)?,
            ),
            None => None,
        };
        nets.push(NetRow {
            net_id,
            name: info.name,
            creator: info.creator.to_hex(),
            created_at: info.created_at,
            member_count: info.member_count,
            is_member,
        });
    }

    Ok(Json(ListResponse { nets }))
}

#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("query failed: {0}")]
    Query(#[from] super::SubmitError),
}

impl IntoResponse for ListError {
    fn into_response(self) -> Response {
        match self {
            ListError::InvalidRequest(msg) => (http::StatusCode::BAD_REQUEST, msg).into_response(),
            ListError::Query(err) => err.into_response(),
        }
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for ListRequest {
    type Response = ListResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/net/list").unwrap();
        client.post(full_url).json(&self)
    }
}
