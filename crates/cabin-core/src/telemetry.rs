//! Shared telemetry state container.
//!
//! [`Telemetry`] owns the three pieces of shared engine state: the live
//! channel values, the history store and the broadcast hub. It is created
//! once, wrapped in [`Arc`](std::sync::Arc), and handed to the simulation
//! clock, the operator console and every connection task.
//!
//! Each structure sits behind its own lock. Locks are only held for the
//! duration of a synchronous operation, never across I/O.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use cabin_types::{ChannelId, ChannelValue, Reading};
use tokio::sync::{Mutex, RwLock};

use crate::history::HistoryStore;
use crate::hub::{BroadcastHub, FireReport, Notifier, NotifierHandle, TickUpdate};
use crate::state::{CabinState, ControlToggle};

/// Channel values, history and notifier registry shared across tasks.
#[derive(Debug, Default)]
pub struct Telemetry {
    state: RwLock<CabinState>,
    history: RwLock<HistoryStore>,
    hub: Mutex<BroadcastHub>,
    last_tick: AtomicU64,
}

impl Telemetry {
    /// Create a container seeded with initial channel values and an empty
    /// history.
    pub fn new(state: CabinState) -> Self {
        Self {
            state: RwLock::new(state),
            history: RwLock::new(HistoryStore::new()),
            hub: Mutex::new(BroadcastHub::new()),
            last_tick: AtomicU64::new(0),
        }
    }

    // -----------------------------------------------------------------------
    // Channel values
    // -----------------------------------------------------------------------

    /// The current value of a channel.
    pub async fn value(&self, id: &str) -> Option<ChannelValue> {
        self.state.read().await.get(id).cloned()
    }

    /// A copy of every current channel value.
    pub async fn values(&self) -> BTreeMap<ChannelId, ChannelValue> {
        self.state.read().await.to_map()
    }

    /// Flip the control channel and return its new value.
    pub async fn toggle(&self, toggle: &ControlToggle) -> ChannelValue {
        toggle.apply(&mut *self.state.write().await)
    }

    /// Run `f` with exclusive access to the channel values.
    pub async fn with_state_mut<R>(&self, f: impl FnOnce(&mut CabinState) -> R) -> R {
        f(&mut *self.state.write().await)
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    /// The full recorded history of a channel (empty if never written).
    pub async fn history(&self, id: &str) -> Vec<Reading> {
        self.history.read().await.get(id).to_vec()
    }

    /// The most recent reading of a channel.
    pub async fn latest(&self, id: &str) -> Option<Reading> {
        self.history.read().await.latest(id).cloned()
    }

    /// Number of readings recorded for a channel.
    pub async fn history_len(&self, id: &str) -> usize {
        self.history.read().await.len(id)
    }

    /// Run `f` with exclusive access to the history store.
    pub async fn with_history_mut<R>(&self, f: impl FnOnce(&mut HistoryStore) -> R) -> R {
        f(&mut *self.history.write().await)
    }

    // -----------------------------------------------------------------------
    // Broadcast hub
    // -----------------------------------------------------------------------

    /// Register a per-connection notifier.
    pub async fn register(&self, notifier: Box<dyn Notifier>) -> NotifierHandle {
        self.hub.lock().await.register(notifier)
    }

    /// Remove a notifier. Returns `false` if it was not registered.
    pub async fn unregister(&self, handle: NotifierHandle) -> bool {
        self.hub.lock().await.unregister(handle)
    }

    /// Fire every registered notifier once with `update` and mark its tick
    /// as the latest completed tick.
    pub async fn fire_all(&self, update: &TickUpdate) -> FireReport {
        self.last_tick.store(update.tick, Ordering::Release);
        self.hub.lock().await.fire_all(update)
    }

    /// The latest tick broadcast so far (0 before the first tick).
    pub fn current_tick(&self) -> u64 {
        self.last_tick.load(Ordering::Acquire)
    }

    /// Number of registered notifiers (connected clients).
    pub async fn connection_count(&self) -> usize {
        self.hub.lock().await.len()
    }
}
