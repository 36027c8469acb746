//! Shared application state for the cabin server.
//!
//! [`AppState`] bundles the handles every connection needs: the telemetry
//! container (live values, history, broadcast hub) and the immutable
//! channel dictionary. Both are reference-counted, so cloning the state
//! for a new connection is cheap.

use std::sync::Arc;

use cabin_core::{Dictionary, Telemetry};

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Channel values, history and notifier registry.
    pub telemetry: Arc<Telemetry>,
    /// The channel registry sent in `dictionary` responses.
    pub dictionary: Arc<Dictionary>,
}

impl AppState {
    /// Create application state over existing engine handles.
    pub const fn new(telemetry: Arc<Telemetry>, dictionary: Arc<Dictionary>) -> Self {
        Self {
            telemetry,
            dictionary,
        }
    }
}
