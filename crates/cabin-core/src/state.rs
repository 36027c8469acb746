//! Live channel values.
//!
//! [`CabinState`] is the single map of current channel values. It is
//! mutated by simulation rules on every tick and by the operator control
//! toggle, and read when readings are recorded. Iteration follows channel
//! id order, which is also the order readings are appended within a tick.

use std::collections::BTreeMap;

use cabin_types::{ChannelId, ChannelValue};

use crate::config::ControlConfig;

/// Current value of every simulated channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CabinState {
    values: BTreeMap<ChannelId, ChannelValue>,
}

impl CabinState {
    /// Create a state from initial channel values.
    pub const fn new(values: BTreeMap<ChannelId, ChannelValue>) -> Self {
        Self { values }
    }

    /// The current value of a channel.
    pub fn get(&self, id: &str) -> Option<&ChannelValue> {
        self.values.get(id)
    }

    /// Set a channel's value, creating the channel if needed.
    pub fn set(&mut self, id: ChannelId, value: ChannelValue) {
        self.values.insert(id, value);
    }

    /// Mutable access to a channel's value.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut ChannelValue> {
        self.values.get_mut(id)
    }

    /// Iterate channels in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&ChannelId, &ChannelValue)> {
        self.values.iter()
    }

    /// Channel ids in id order.
    pub fn channel_ids(&self) -> impl Iterator<Item = &ChannelId> {
        self.values.keys()
    }

    /// Number of channels.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no channels.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A copy of every channel value.
    pub fn to_map(&self) -> BTreeMap<ChannelId, ChannelValue> {
        self.values.clone()
    }
}

/// Flips a two-state control channel between its "on" and "off" values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlToggle {
    /// The toggled channel.
    pub channel: ChannelId,
    /// The "on" state.
    pub on: String,
    /// The "off" state.
    pub off: String,
}

impl ControlToggle {
    /// Build a toggle from configuration.
    pub fn from_config(config: &ControlConfig) -> Self {
        Self {
            channel: config.channel.clone(),
            on: config.on.clone(),
            off: config.off.clone(),
        }
    }

    /// Flip the control and return its new value.
    ///
    /// The control goes to "on" only from exactly "off"; any other current
    /// value (including a missing channel) goes to "off".
    pub fn apply(&self, state: &mut CabinState) -> ChannelValue {
        let is_off = state
            .get(self.channel.as_str())
            .and_then(ChannelValue::as_state)
            .is_some_and(|s| s == self.off);
        let next = if is_off {
            ChannelValue::state(&self.on)
        } else {
            ChannelValue::state(&self.off)
        };
        state.set(self.channel.clone(), next.clone());
        next
    }
}
