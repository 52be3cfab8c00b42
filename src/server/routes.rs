//! Route table

use axum::routing::{get, post};
use axum::Router;

use super::handlers;
use super::state::AppState;
use super::trace::http_trace_layer;

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route(
            "/stream/{key}/",
            get(handlers::read_stream).post(handlers::publish),
        )
        .route("/push/{hash}/", post(handlers::push))
        .layer(http_trace_layer())
        .with_state(state)
}
