//! Client-facing server for the cabin telemetry service.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/`) speaking the line-based command
//!   protocol: `dictionary`, `subscribe <id>`, `unsubscribe <id>`,
//!   `history <id>`, plus a `data` push per subscribed channel after every
//!   tick
//! - **REST endpoints** for read-only status (`/api/status`,
//!   `/api/channels/{id}/history`)
//!
//! # Architecture
//!
//! Every connection owns a [`ConnectionManager`] holding its subscription
//! set and registers a [`TickNotifier`] with the broadcast hub in
//! [`cabin_core::Telemetry`]. The simulation clock fires the hub once per
//! tick with the readings recorded in that tick; each connection pushes the
//! ones it subscribes to. Disconnecting unregisters the notifier.
//!
//! [`ConnectionManager`]: connection::ConnectionManager
//! [`TickNotifier`]: connection::TickNotifier

pub mod connection;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError, serve, start_server};
pub use startup::spawn_server;
pub use state::AppState;
