//! Server startup helper for embedding in the engine binary.
//!
//! Provides [`spawn_server`] which binds the listening socket and then
//! serves on a background Tokio task, so the tick loop and client
//! connections run concurrently.
//!
//! # Usage
//!
//! ```rust,ignore
//! use cabin_server::startup::spawn_server;
//!
//! let handle = spawn_server(&config, state).await?;
//! // The server is now running. The handle can be awaited on shutdown.
//! ```

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::server::{ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Bind the configured address and serve on a background task.
///
/// Binding happens before the task is spawned, so an address that is
/// malformed or already in use is reported to the caller immediately.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the server cannot bind.
pub async fn spawn_server(
    config: &ServerConfig,
    state: Arc<AppState>,
) -> Result<JoinHandle<()>, StartupError> {
    let listener = crate::server::bind(config).await?;

    let handle = tokio::spawn(async move {
        if let Err(e) = crate::server::serve(listener, state).await {
            tracing::error!(error = %e, "Cabin server exited with error");
        }
    });

    tracing::info!(port = config.port, "Cabin server spawned on background task");

    Ok(handle)
}
