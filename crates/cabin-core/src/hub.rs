//! Broadcast hub: per-connection notifiers fired after every tick.
//!
//! Each connection registers one [`Notifier`] and receives an opaque
//! [`NotifierHandle`]. Handles come from a monotonically increasing counter
//! and key a [`BTreeMap`], so a fire pass walks notifiers in registration
//! order and removal is a direct lookup by handle.
//!
//! Every notifier receives the same [`TickUpdate`]: the tick number and the
//! readings recorded in that tick. A connection that falls behind still
//! pushes each tick's own readings when it catches up.
//!
//! A failing notifier never stops the pass: the failure is logged and the
//! remaining notifiers are still invoked.

use std::collections::BTreeMap;
use std::sync::Arc;

use cabin_types::{ChannelId, Reading};
use tracing::warn;

/// Errors a notifier can report when invoked.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifyError {
    /// The connection behind the notifier has gone away.
    #[error("connection closed")]
    Disconnected,

    /// The connection has too many undelivered ticks queued.
    #[error("connection lagging, tick dropped")]
    Lagging,
}

/// The readings recorded in one tick, shared by every notifier.
#[derive(Debug, Clone, PartialEq)]
pub struct TickUpdate {
    /// The tick number (first tick is 1).
    pub tick: u64,
    /// Reading appended for each channel in this tick.
    pub readings: Arc<BTreeMap<ChannelId, Reading>>,
}

impl TickUpdate {
    /// Bundle a tick's readings.
    pub fn new(tick: u64, readings: BTreeMap<ChannelId, Reading>) -> Self {
        Self {
            tick,
            readings: Arc::new(readings),
        }
    }

    /// The reading recorded for `id` in this tick.
    pub fn reading(&self, id: &str) -> Option<&Reading> {
        self.readings.get(id)
    }
}

/// Per-connection callback invoked once per tick.
///
/// Implementations must not block: they hand the update off to the
/// connection task and return.
pub trait Notifier: Send + Sync {
    /// Deliver the readings of a completed tick.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if the notification could not be delivered.
    fn notify(&self, update: &TickUpdate) -> Result<(), NotifyError>;
}

/// Opaque registration handle returned by [`BroadcastHub::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NotifierHandle(u64);

impl core::fmt::Display for NotifierHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of one [`BroadcastHub::fire_all`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FireReport {
    /// Notifiers invoked successfully.
    pub delivered: usize,
    /// Notifiers that returned an error.
    pub failed: usize,
}

/// Registry of notifiers keyed by handle.
#[derive(Default)]
pub struct BroadcastHub {
    next_handle: u64,
    notifiers: BTreeMap<NotifierHandle, Box<dyn Notifier>>,
}

impl BroadcastHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a notifier and return its handle.
    pub fn register(&mut self, notifier: Box<dyn Notifier>) -> NotifierHandle {
        let handle = NotifierHandle(self.next_handle);
        self.next_handle = self.next_handle.saturating_add(1);
        self.notifiers.insert(handle, notifier);
        handle
    }

    /// Remove a notifier. Returns `false` if the handle was not registered.
    pub fn unregister(&mut self, handle: NotifierHandle) -> bool {
        self.notifiers.remove(&handle).is_some()
    }

    /// Invoke every registered notifier, in registration order.
    pub fn fire_all(&self, update: &TickUpdate) -> FireReport {
        let mut report = FireReport::default();
        for (handle, notifier) in &self.notifiers {
            match notifier.notify(update) {
                Ok(()) => report.delivered = report.delivered.saturating_add(1),
                Err(e) => {
                    warn!(%handle, tick = update.tick, error = %e, "notifier failed");
                    report.failed = report.failed.saturating_add(1);
                }
            }
        }
        report
    }

    /// Number of registered notifiers.
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    /// Whether no notifier is registered.
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl core::fmt::Debug for BroadcastHub {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BroadcastHub")
            .field("next_handle", &self.next_handle)
            .field("registered", &self.notifiers.len())
            .finish()
    }
}
