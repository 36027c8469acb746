//! Engine binary for the cabin telemetry service.
//!
//! This is the main entry point that wires together the telemetry state,
//! the simulation clock, the client server and the operator console. It
//! loads configuration, initializes all subsystems, and ticks the
//! simulation until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `cabin-config.yaml`
//! 3. Load the channel dictionary (fatal on failure)
//! 4. Seed the telemetry state with the configured channel values
//! 5. Start the client server
//! 6. Start the operator console on stdin
//! 7. Run the simulation clock until shutdown

mod console;
mod error;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use cabin_core::config::CabinConfig;
use cabin_core::rules::LinearDecay;
use cabin_core::runner;
use cabin_core::state::{CabinState, ControlToggle};
use cabin_core::{Dictionary, SimulationClock, Telemetry};
use cabin_server::{AppState, ServerConfig};
use cabin_types::ChannelId;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Default configuration file, relative to the working directory.
const CONFIG_FILE: &str = "cabin-config.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration, the dictionary or the server
/// cannot be initialized.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1-2. Configuration is read before logging so its level can apply.
    let config_path = config_path();
    let config = load_config(&config_path);

    init_tracing(config.as_ref().map_or("info", |c| c.logging.level.as_str()));
    info!("cabin-engine starting");

    let config = config.inspect_err(|e| error!(error = %e, "failed to load configuration"))?;
    info!(
        path = %config_path.display(),
        port = config.server.port,
        dictionary = %config.telemetry.dictionary_path,
        tick_interval_ms = config.telemetry.tick_interval_ms,
        "Configuration loaded"
    );

    // 3. Load the dictionary; the service never serves without it.
    let dictionary = Dictionary::load(Path::new(&config.telemetry.dictionary_path))
        .inspect_err(|e| error!(error = %e, "failed to load channel dictionary"))?;
    warn_undescribed_channels(&dictionary, config.simulation.channels.keys());
    let dictionary = Arc::new(dictionary);

    // 4. Seed telemetry state.
    let telemetry = Arc::new(Telemetry::new(CabinState::new(
        config.simulation.channels.clone(),
    )));
    info!(channels = config.simulation.channels.len(), "Telemetry state initialized");

    // 5. Start the client server.
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    let app_state = Arc::new(AppState::new(Arc::clone(&telemetry), dictionary));
    let _server_handle = cabin_server::spawn_server(&server_config, app_state)
        .await
        .inspect_err(|e| error!(error = %e, "failed to start server"))?;
    info!(port = server_config.port, "Example cabin running");

    // 6. Operator console.
    let toggle = ControlToggle::from_config(&config.simulation.control);
    info!(channel = %toggle.channel, "Press Enter to toggle the control channel");
    let _console_handle = tokio::spawn(console::run_console(
        tokio::io::BufReader::new(tokio::io::stdin()),
        Arc::clone(&telemetry),
        toggle,
    ));

    // 7. Run the clock.
    let mut clock = SimulationClock::new(telemetry)
        .with_rule(Box::new(LinearDecay::from_config(&config.simulation.decay)))
        .with_traffic_channel(config.simulation.traffic_channel.clone());
    let interval = Duration::from_millis(config.telemetry.tick_interval_ms);

    let total_ticks = runner::run_clock(&mut clock, interval, shutdown_signal()).await;

    info!(total_ticks, "cabin-engine shutdown complete");
    Ok(())
}

/// The configuration path: `CABIN_CONFIG` if set, else `cabin-config.yaml`.
fn config_path() -> PathBuf {
    std::env::var_os("CABIN_CONFIG").map_or_else(|| PathBuf::from(CONFIG_FILE), PathBuf::from)
}

/// Load configuration, falling back to defaults when the file is absent.
fn load_config(path: &Path) -> Result<CabinConfig, EngineError> {
    if path.exists() {
        Ok(CabinConfig::from_file(path)?)
    } else {
        let mut config = CabinConfig::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}

/// Initialize the global subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(true)
        .init();
}

/// Log simulated channels that the dictionary does not describe.
fn warn_undescribed_channels<'a>(
    dictionary: &Dictionary,
    channels: impl Iterator<Item = &'a ChannelId>,
) {
    let described = dictionary.channel_keys();
    let missing: BTreeSet<&ChannelId> = channels.filter(|id| !described.contains(*id)).collect();
    for id in missing {
        warn!(channel = %id, "simulated channel is not described by the dictionary");
    }
}

/// Resolve on `Ctrl-C`. If the signal handler cannot be installed, never
/// resolve so the service keeps running.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
