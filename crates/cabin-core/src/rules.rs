//! Simulation rules applied to the cabin state on every tick.
//!
//! A rule is any [`SimulationRule`]; the clock applies its rules in
//! registration order before recording readings. The reference cabin has a
//! single rule, [`LinearDecay`]: the temperature drops by a fixed step per
//! tick while the aircon is on, and never below zero.

use cabin_types::{ChannelId, ChannelValue};

use crate::config::DecayConfig;
use crate::state::CabinState;

/// A per-tick mutation of channel values.
pub trait SimulationRule: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Apply one simulation step.
    fn apply(&self, state: &mut CabinState);
}

/// Decays a numeric channel toward zero while a control channel holds a
/// given state.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearDecay {
    /// The decaying channel.
    pub channel: ChannelId,
    /// The gating control channel.
    pub control: ChannelId,
    /// Control state under which the decay applies.
    pub active_value: String,
    /// Amount subtracted per tick.
    pub step: f64,
}

impl LinearDecay {
    /// Build the rule from configuration.
    pub fn from_config(config: &DecayConfig) -> Self {
        Self {
            channel: config.channel.clone(),
            control: config.control.clone(),
            active_value: config.active_value.clone(),
            step: config.step,
        }
    }

    fn is_active(&self, state: &CabinState) -> bool {
        state
            .get(self.control.as_str())
            .and_then(ChannelValue::as_state)
            .is_some_and(|s| s == self.active_value)
    }
}

impl SimulationRule for LinearDecay {
    fn name(&self) -> &str {
        "linear_decay"
    }

    fn apply(&self, state: &mut CabinState) {
        if !self.is_active(state) {
            return;
        }
        if let Some(ChannelValue::Number(value)) = state.get_mut(self.channel.as_str()) {
            *value = (*value - self.step).max(0.0);
        }
    }
}
