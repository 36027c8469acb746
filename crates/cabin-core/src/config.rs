//! Configuration loading and typed config structures for the cabin service.
//!
//! The configuration lives in `cabin-config.yaml` next to the binary's
//! working directory. This module defines strongly-typed structs that
//! mirror the YAML structure, and provides a loader that reads and
//! validates the file. Every field has a default, so an empty (or missing)
//! file yields the reference cabin: four channels, a one-second tick and
//! the aircon-driven temperature decay.

use std::collections::BTreeMap;
use std::path::Path;

use cabin_types::{ChannelId, ChannelValue};
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but holds an unusable value.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level service configuration.
///
/// Mirrors the structure of `cabin-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CabinConfig {
    /// Listening address for client connections.
    #[serde(default)]
    pub server: ServerSection,

    /// Dictionary source and tick timing.
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Initial channel values and simulation rules.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CabinConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `CABIN_PORT` overrides `server.port`
    /// - `CABIN_DICTIONARY` overrides `telemetry.dictionary_path`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value fails validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value fails validation.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Override selected values with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CABIN_PORT") {
            match val.parse() {
                Ok(port) => self.server.port = port,
                Err(e) => tracing::warn!(value = %val, error = %e, "ignoring invalid CABIN_PORT"),
            }
        }
        if let Ok(val) = std::env::var("CABIN_DICTIONARY") {
            self.telemetry.dictionary_path = val;
        }
    }

    /// Check values that parse fine but cannot drive the service.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telemetry.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                reason: "telemetry.tick_interval_ms must be at least 1".to_owned(),
            });
        }
        let step = self.simulation.decay.step;
        if !step.is_finite() || step < 0.0 {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "simulation.decay.step must be a finite non-negative number, got {step}"
                ),
            });
        }
        Ok(())
    }
}

/// Listening address for the client server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Dictionary source and tick timing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TelemetryConfig {
    /// Path of the JSON channel dictionary.
    #[serde(default = "default_dictionary_path")]
    pub dictionary_path: String,

    /// Real-time milliseconds between ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            dictionary_path: default_dictionary_path(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

/// Initial channel values and the rules that mutate them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Channel values at startup, keyed by channel id.
    #[serde(default = "default_channels")]
    pub channels: BTreeMap<ChannelId, ChannelValue>,

    /// The linear decay rule.
    #[serde(default)]
    pub decay: DecayConfig,

    /// The operator-toggled control channel.
    #[serde(default)]
    pub control: ControlConfig,

    /// Channel that accumulates the serialized size of every reading.
    /// `null` disables traffic accounting.
    #[serde(default = "default_traffic_channel")]
    pub traffic_channel: Option<ChannelId>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            channels: default_channels(),
            decay: DecayConfig::default(),
            control: ControlConfig::default(),
            traffic_channel: default_traffic_channel(),
        }
    }
}

/// A channel that decays toward zero while a control channel is active.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DecayConfig {
    /// The decaying channel.
    #[serde(default = "default_decay_channel")]
    pub channel: ChannelId,

    /// The channel gating the decay.
    #[serde(default = "default_control_channel")]
    pub control: ChannelId,

    /// Control value under which the decay applies.
    #[serde(default = "default_on")]
    pub active_value: String,

    /// Amount subtracted per tick.
    #[serde(default = "default_decay_step")]
    pub step: f64,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            channel: default_decay_channel(),
            control: default_control_channel(),
            active_value: default_on(),
            step: default_decay_step(),
        }
    }
}

/// The two-state channel flipped from the operator console.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ControlConfig {
    /// The toggled channel.
    #[serde(default = "default_control_channel")]
    pub channel: ChannelId,

    /// The "on" state.
    #[serde(default = "default_on")]
    pub on: String,

    /// The "off" state.
    #[serde(default = "default_off")]
    pub off: String,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            channel: default_control_channel(),
            on: default_on(),
            off: default_off(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8081
}

fn default_dictionary_path() -> String {
    "dictionary.json".to_owned()
}

const fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_channels() -> BTreeMap<ChannelId, ChannelValue> {
    let mut m = BTreeMap::new();
    m.insert(ChannelId::from("sns.temp"), ChannelValue::Number(22.0));
    m.insert(ChannelId::from("prop.aircon"), ChannelValue::state("OFF"));
    m.insert(ChannelId::from("comms.recd"), ChannelValue::Number(0.0));
    m.insert(ChannelId::from("comms.sent"), ChannelValue::Number(0.0));
    m
}

fn default_decay_channel() -> ChannelId {
    ChannelId::from("sns.temp")
}

fn default_control_channel() -> ChannelId {
    ChannelId::from("prop.aircon")
}

fn default_on() -> String {
    "ON".to_owned()
}

fn default_off() -> String {
    "OFF".to_owned()
}

const fn default_decay_step() -> f64 {
    0.02
}

fn default_traffic_channel() -> Option<ChannelId> {
    Some(ChannelId::from("comms.sent"))
}

fn default_log_level() -> String {
    "info".to_owned()
}
