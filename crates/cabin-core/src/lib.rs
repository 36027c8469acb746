//! Telemetry engine for the cabin service.
//!
//! This crate owns the stateful core of the service: the simulation clock
//! that advances channel values, the append-only history of readings, and
//! the broadcast hub that notifies every connection after each tick.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `cabin-config.yaml` into
//!   strongly-typed structs.
//! - [`dictionary`] -- The static channel registry sent to clients.
//! - [`state`] -- Live channel values and the control toggle.
//! - [`rules`] -- [`SimulationRule`] trait and the [`LinearDecay`] rule.
//! - [`history`] -- Append-only per-channel reading log.
//! - [`hub`] -- Handle-based registry of per-connection notifiers.
//! - [`telemetry`] -- The shared state container.
//! - [`clock`] -- One tick: simulate, record, broadcast.
//! - [`runner`] -- The periodic tick loop.
//!
//! [`SimulationRule`]: rules::SimulationRule
//! [`LinearDecay`]: rules::LinearDecay

pub mod clock;
pub mod config;
pub mod dictionary;
pub mod history;
pub mod hub;
pub mod rules;
pub mod runner;
pub mod state;
pub mod telemetry;

pub use clock::{SimulationClock, TickSummary};
pub use config::CabinConfig;
pub use dictionary::Dictionary;
pub use hub::{Notifier, NotifierHandle, NotifyError, TickUpdate};
pub use telemetry::Telemetry;
