//! HTTP pieces shared by every server variant

pub mod health;

use axum::response::{IntoResponse, Response};
use http::StatusCode;

/// Fallback handler for unknown routes
pub async fn not_found_handler() -> Response {
    (StatusCode::NOT_FOUND, "not found").into_response()
}
