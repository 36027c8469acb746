//! REST handlers for read-only status queries.
//!
//! These mirror what a WebSocket client can see, for operators and health
//! checks that do not speak the command protocol.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;

use crate::error::ApiError;
use crate::state::AppState;

/// Current tick, connection count and channel values.
///
/// # Route
///
/// `GET /api/status`
///
/// # Errors
///
/// Returns [`ApiError::Serialization`] if the channel values cannot be
/// encoded.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let channels = serde_json::to_value(state.telemetry.values().await)?;
    Ok(Json(serde_json::json!({
        "tick": state.telemetry.current_tick(),
        "connections": state.telemetry.connection_count().await,
        "channels": channels,
    })))
}

/// Recorded history of a single channel.
///
/// A channel that has never been written has an empty history, not an
/// error.
///
/// # Route
///
/// `GET /api/channels/{id}/history`
pub async fn get_channel_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let readings = state.telemetry.history(&id).await;
    Json(serde_json::json!({
        "id": id,
        "count": readings.len(),
        "readings": readings,
    }))
}
