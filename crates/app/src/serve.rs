//! Daemon server assembly

use std::net::SocketAddr;

use anyhow::Result;
use axum::Router;
use http::header::{ACCEPT, CONTENT_TYPE, ORIGIN};
use http::Method;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use service::ServiceState;

/// Run the submission API server until the shutdown signal fires
pub async fn run_api_server(
    listen_addr: SocketAddr,
    state: ServiceState,
    mut shutdown_rx: watch::Receiver<()>,
) -> Result<()> {
    let cors_layer = CorsLayer::new()
        .allow_methods(vec![Method::GET, Method::POST])
        .allow_headers(vec![ACCEPT, CONTENT_TYPE, ORIGIN])
        .allow_origin(Any)
        .allow_credentials(false);

    let trace_layer = TraceLayer::new_for_http();

    let router = Router::new()
        .nest("/_status", service::http::health::router(state.clone()))
        .nest("/api", crate::http::api::router(state.clone()))
        .fallback(service::http::not_found_handler)
        .with_state(state)
        .layer(cors_layer)
        .layer(trace_layer);

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await?;

    Ok(())
}
