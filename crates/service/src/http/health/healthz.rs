use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde::Serialize;

use crate::ServiceState;

#[derive(Serialize)]
struct Health {
    status: &'static str,
    node_id: String,
}

#[tracing::instrument(skip_all)]
pub async fn handler(State(state): State<ServiceState>) -> Response {
    (
        StatusCode::OK,
        Json(Health {
            status: "ok",
            node_id: state.node_id().to_hex(),
        }),
    )
        .into_response()
}
