//! Client protocol: inbound commands and outbound messages.
//!
//! Clients send single text lines of whitespace-separated tokens, verb
//! first (`subscribe sns.temp`). The server answers with JSON records
//! tagged by a `type` field:
//!
//! ```text
//! {"type":"dictionary","value":{...}}
//! {"type":"history","id":"sns.temp","value":[{"timestamp":..,"value":22.0}, ...]}
//! {"type":"data","id":"sns.temp","value":{"timestamp":..,"value":21.98}}
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::ChannelId;
use crate::structs::Reading;

/// A parsed inbound command.
///
/// Parsing never fails: anything outside the fixed verb set, or a verb
/// missing its argument, becomes [`Command::Unrecognized`] and is ignored
/// by the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Request the full channel dictionary.
    Dictionary,
    /// Start receiving pushes for a channel.
    Subscribe(ChannelId),
    /// Stop receiving pushes for a channel.
    Unsubscribe(ChannelId),
    /// Request the full recorded history of a channel.
    History(ChannelId),
    /// Unknown verb or malformed arguments.
    Unrecognized,
}

impl Command {
    /// Parse a command line. Extra trailing tokens are ignored.
    pub fn parse(line: &str) -> Self {
        let mut tokens = line.split_whitespace();
        let verb = tokens.next();
        let arg = tokens.next().map(ChannelId::from);

        match (verb, arg) {
            (Some("dictionary"), _) => Self::Dictionary,
            (Some("subscribe"), Some(id)) => Self::Subscribe(id),
            (Some("unsubscribe"), Some(id)) => Self::Unsubscribe(id),
            (Some("history"), Some(id)) => Self::History(id),
            _ => Self::Unrecognized,
        }
    }
}

/// An outbound message pushed to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum ServerMessage {
    /// Response to `dictionary`: the channel registry contents, verbatim.
    Dictionary {
        /// The dictionary document.
        value: serde_json::Value,
    },
    /// Response to `history <id>`: every reading recorded so far.
    History {
        /// The requested channel.
        id: ChannelId,
        /// Readings in append order; empty if nothing was recorded.
        value: Vec<Reading>,
    },
    /// Per-tick push of the latest reading of a subscribed channel.
    Data {
        /// The subscribed channel.
        id: ChannelId,
        /// The channel's most recent reading.
        value: Reading,
    },
}

impl ServerMessage {
    /// Serialize to the JSON text sent over the wire.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
