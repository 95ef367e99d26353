//! Axum router construction for the Keywatch server.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /db/{key}` -- read a value
/// - `POST /db/{key}` -- write a value and notify the watcher
/// - `GET /watch` -- `WebSocket` change feed
/// - `GET /health` -- liveness
///
/// The key segment is captured as a wildcard so that keys containing a
/// slash reach the handler and are rejected with 400 rather than 404.
/// Values have no size limit, so the default body limit is disabled on
/// that route.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/db/{*key}",
            get(handlers::get_value)
                .post(handlers::set_value)
                .fallback(handlers::method_not_allowed)
                .layer(DefaultBodyLimit::disable()),
        )
        .route("/watch", get(ws::watch))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
