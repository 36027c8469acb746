//! Channel registry: the static dictionary describing known channels.
//!
//! The dictionary is a JSON document (names, keys, units, value formats)
//! that clients fetch once for display purposes. It is loaded at startup,
//! kept verbatim and never mutated, so every connection can share it
//! behind an [`Arc`](std::sync::Arc) without synchronization.

use std::collections::BTreeSet;
use std::path::Path;

use cabin_types::ChannelId;

/// Errors that can occur when loading the dictionary.
#[derive(Debug, thiserror::Error)]
pub enum DictionaryError {
    /// Failed to read the dictionary file.
    #[error("failed to read dictionary {path}: {source}")]
    Io {
        /// The file that could not be read.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid JSON.
    #[error("failed to parse dictionary {path}: {source}")]
    Json {
        /// The file that could not be parsed.
        path: String,
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}

/// Immutable channel metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Dictionary {
    document: serde_json::Value,
}

impl Dictionary {
    /// Read and parse a dictionary file.
    ///
    /// # Errors
    ///
    /// Returns [`DictionaryError::Io`] if the file cannot be read or
    /// [`DictionaryError::Json`] if it is not valid JSON. Callers treat
    /// either as fatal.
    pub fn load(path: &Path) -> Result<Self, DictionaryError> {
        let display = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|source| DictionaryError::Io {
            path: display.clone(),
            source,
        })?;
        let document = serde_json::from_str(&contents).map_err(|source| DictionaryError::Json {
            path: display,
            source,
        })?;
        Ok(Self { document })
    }

    /// Wrap an already-parsed document.
    pub const fn from_value(document: serde_json::Value) -> Self {
        Self { document }
    }

    /// The raw document, as sent to clients.
    pub const fn document(&self) -> &serde_json::Value {
        &self.document
    }

    /// Channel keys described under `measurements[].key`.
    ///
    /// Entries without a string `key` are skipped.
    pub fn channel_keys(&self) -> BTreeSet<ChannelId> {
        self.document
            .get("measurements")
            .and_then(serde_json::Value::as_array)
            .map(|measurements| {
                measurements
                    .iter()
                    .filter_map(|m| m.get("key").and_then(serde_json::Value::as_str))
                    .map(ChannelId::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}
