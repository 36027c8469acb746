//! Error types for the status API.
//!
//! [`ApiError`] renders as a JSON body `{ "error": ..., "status": ... }`
//! through its [`IntoResponse`](axum::response::IntoResponse) impl.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors returned by the REST handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Channel values could not be encoded.
    #[error("failed to encode response: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status for this error.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });
        (status, axum::Json(body)).into_response()
    }
}
