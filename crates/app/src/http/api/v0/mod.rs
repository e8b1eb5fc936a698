use axum::Router;

pub mod net;

use service::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .nest("/net", net::router(state.clone()))
        .with_state(state)
}
