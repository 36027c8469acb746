//! Shared type definitions for the cabin telemetry service.
//!
//! Every crate in the workspace, and every client, agrees on these types.
//! They flow downstream to `TypeScript` via `ts-rs` for dashboard clients.
//!
//! # Modules
//!
//! - [`ids`] -- Channel identifiers
//! - [`structs`] -- Channel values and recorded readings
//! - [`protocol`] -- Inbound commands and outbound wire messages

pub mod ids;
pub mod protocol;
pub mod structs;

pub use ids::ChannelId;
pub use protocol::{Command, ServerMessage};
pub use structs::{ChannelValue, Reading};
