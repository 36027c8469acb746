//! Per-connection command handling and tick fan-out.
//!
//! A [`ConnectionManager`] exists for every connected client. It owns the
//! client's subscription set, which no other connection ever reads or
//! writes, and turns inbound [`Command`]s and tick updates into outbound
//! [`ServerMessage`]s. Transport concerns live in [`crate::ws`].

use std::sync::Arc;

use cabin_core::{Dictionary, Notifier, NotifyError, Telemetry, TickUpdate};
use cabin_types::{ChannelId, Command, ServerMessage};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

/// Ticks a connection may fall behind before further ticks are dropped
/// for it.
pub const TICK_BACKLOG: usize = 64;

/// Subscription state and command dispatch for one client.
#[derive(Debug)]
pub struct ConnectionManager {
    telemetry: Arc<Telemetry>,
    dictionary: Arc<Dictionary>,
    /// Subscribed channels in insertion order, without duplicates.
    subscriptions: Vec<ChannelId>,
}

impl ConnectionManager {
    /// Create a manager with an empty subscription set.
    pub const fn new(telemetry: Arc<Telemetry>, dictionary: Arc<Dictionary>) -> Self {
        Self {
            telemetry,
            dictionary,
            subscriptions: Vec::new(),
        }
    }

    /// The current subscription set, in insertion order.
    pub fn subscriptions(&self) -> &[ChannelId] {
        &self.subscriptions
    }

    /// Parse and dispatch one inbound text line.
    pub async fn handle_line(&mut self, line: &str) -> Option<ServerMessage> {
        self.dispatch(Command::parse(line)).await
    }

    /// Apply a command. Returns the response to send, if any.
    pub async fn dispatch(&mut self, command: Command) -> Option<ServerMessage> {
        match command {
            Command::Dictionary => Some(ServerMessage::Dictionary {
                value: self.dictionary.document().clone(),
            }),
            Command::Subscribe(id) => {
                if !self.subscriptions.contains(&id) {
                    debug!(channel = %id, "subscribed");
                    self.subscriptions.push(id);
                }
                None
            }
            Command::Unsubscribe(id) => {
                self.subscriptions.retain(|s| *s != id);
                None
            }
            Command::History(id) => {
                let value = self.telemetry.history(id.as_str()).await;
                Some(ServerMessage::History { id, value })
            }
            Command::Unrecognized => None,
        }
    }

    /// One `data` message per subscribed channel recorded in `update`, in
    /// subscription order.
    pub fn updates(&self, update: &TickUpdate) -> Vec<ServerMessage> {
        self.subscriptions
            .iter()
            .filter_map(|id| {
                update.reading(id.as_str()).map(|reading| ServerMessage::Data {
                    id: id.clone(),
                    value: reading.clone(),
                })
            })
            .collect()
    }
}

/// Broadcast hub notifier that queues tick updates for a connection task.
///
/// The queue holds at most [`TICK_BACKLOG`] updates; a connection that far
/// behind has further ticks dropped and reported as
/// [`NotifyError::Lagging`].
#[derive(Debug, Clone)]
pub struct TickNotifier {
    tx: mpsc::Sender<TickUpdate>,
}

impl TickNotifier {
    /// Create a notifier and the receiver its connection task listens on.
    pub fn channel() -> (Self, mpsc::Receiver<TickUpdate>) {
        let (tx, rx) = mpsc::channel(TICK_BACKLOG);
        (Self { tx }, rx)
    }
}

impl Notifier for TickNotifier {
    fn notify(&self, update: &TickUpdate) -> Result<(), NotifyError> {
        self.tx.try_send(update.clone()).map_err(|e| match e {
            TrySendError::Full(_) => NotifyError::Lagging,
            TrySendError::Closed(_) => NotifyError::Disconnected,
        })
    }
}
