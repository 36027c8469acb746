//! Channel values and recorded readings.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// The current value of a channel.
///
/// Sensors carry numbers (`sns.temp = 21.98`); actuators carry a small
/// enumerated state (`prop.aircon = "ON"`). The variants are untagged so a
/// value serializes as a bare JSON number or string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export, export_to = "bindings/")]
pub enum ChannelValue {
    /// A numeric sensor reading or counter.
    Number(f64),
    /// A discrete actuator state such as `"ON"` or `"OFF"`.
    State(String),
}

impl ChannelValue {
    /// Build a state value from a string slice.
    pub fn state(value: &str) -> Self {
        Self::State(value.to_owned())
    }

    /// The numeric value, if this is a number.
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::State(_) => None,
        }
    }

    /// The state string, if this is a discrete state.
    pub fn as_state(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::State(s) => Some(s),
        }
    }
}

impl From<f64> for ChannelValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for ChannelValue {
    fn from(value: &str) -> Self {
        Self::state(value)
    }
}

impl core::fmt::Display for ChannelValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::State(s) => f.write_str(s),
        }
    }
}

/// An immutable `(timestamp, value)` pair recorded for one channel at one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Reading {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// The channel's value at that tick.
    pub value: ChannelValue,
}

impl Reading {
    /// Create a reading.
    pub const fn new(timestamp: i64, value: ChannelValue) -> Self {
        Self { timestamp, value }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn integer_deserializes_as_number() {
        let value: ChannelValue = serde_json::from_str("22").unwrap();
        assert_eq!(value.as_number().map(|n| n > 21.9 && n < 22.1), Some(true));
    }

    #[test]
    fn string_deserializes_as_state() {
        let value: ChannelValue = serde_json::from_str("\"OFF\"").unwrap();
        assert_eq!(value.as_state(), Some("OFF"));
    }

    #[test]
    fn reading_wire_shape() {
        let reading = Reading::new(1_700_000_000_000, ChannelValue::state("ON"));
        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["timestamp"], 1_700_000_000_000_i64);
        assert_eq!(json["value"], "ON");
    }
}
