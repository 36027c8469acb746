//! Channel identifiers.
//!
//! Channels are addressed by dotted string keys such as `sns.temp` or
//! `prop.aircon`. [`ChannelId`] wraps the key so it cannot be confused with
//! arbitrary strings (command verbs, channel values) at compile time, while
//! still serializing as a bare JSON string on the wire.

use std::borrow::Borrow;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Identifier of a telemetry channel (e.g. `sns.temp`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export, export_to = "bindings/")]
pub struct ChannelId(String);

impl ChannelId {
    /// Create a channel identifier from any string-like key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrow the underlying key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the owned key.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl core::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(key: &str) -> Self {
        Self(key.to_owned())
    }
}

impl From<String> for ChannelId {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl AsRef<str> for ChannelId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets `BTreeMap<ChannelId, _>` be queried with a plain `&str`.
impl Borrow<str> for ChannelId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
