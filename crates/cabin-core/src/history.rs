//! Append-only per-channel history of readings.
//!
//! The store records exactly one [`Reading`] per channel per tick and never
//! removes anything. Growth is unbounded for the lifetime of the process;
//! there is no seek, windowing or compaction.

use std::collections::BTreeMap;

use cabin_types::{ChannelId, Reading};

/// Ordered log of readings, keyed by channel id.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    entries: BTreeMap<ChannelId, Vec<Reading>>,
}

impl HistoryStore {
    /// Create an empty store.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Record `reading` as the new last entry for `id`.
    pub fn append(&mut self, id: &ChannelId, reading: Reading) {
        if let Some(log) = self.entries.get_mut(id.as_str()) {
            log.push(reading);
        } else {
            self.entries.insert(id.clone(), vec![reading]);
        }
    }

    /// Every reading recorded for `id`, oldest first. Empty if the channel
    /// was never written.
    pub fn get(&self, id: &str) -> &[Reading] {
        self.entries.get(id).map_or(&[], Vec::as_slice)
    }

    /// The most recent reading for `id`.
    pub fn latest(&self, id: &str) -> Option<&Reading> {
        self.entries.get(id).and_then(|log| log.last())
    }

    /// Number of readings recorded for `id`.
    pub fn len(&self, id: &str) -> usize {
        self.entries.get(id).map_or(0, Vec::len)
    }

    /// Number of channels with at least one reading.
    pub fn channel_count(&self) -> usize {
        self.entries.len()
    }
}
