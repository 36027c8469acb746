//! Axum router construction for the cabin server.
//!
//! Assembles the client `WebSocket` endpoint and the status routes into a
//! single [`Router`] with CORS middleware enabled for browser clients.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` -- `WebSocket` client protocol
/// - `GET /api/status` -- tick, connections and channel values
/// - `GET /api/channels/{id}/history` -- recorded readings of one channel
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(ws::ws_connect))
        .route("/api/status", get(handlers::get_status))
        .route("/api/channels/{id}/history", get(handlers::get_channel_history))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
