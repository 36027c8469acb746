//! `WebSocket` transport for the client protocol.
//!
//! Clients connect to `GET /` and exchange text frames: commands inbound,
//! JSON messages outbound. Each connection registers a [`TickNotifier`]
//! with the broadcast hub for its lifetime; for every tick it receives,
//! the handler pushes that tick's reading of each subscribed channel.
//!
//! When the connection ends, for any reason, the notifier is unregistered
//! so later ticks never target it.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use cabin_types::ServerMessage;
use tracing::{debug, info, warn};

use crate::connection::{ConnectionManager, TickNotifier};
use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` client connection.
///
/// # Route
///
/// `GET /`
pub async fn ws_connect(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Why a connection loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Closed {
    /// The client closed the socket or it errored.
    Client,
    /// A send to the client failed.
    SendFailed,
    /// The notifier was dropped (hub gone).
    HubClosed,
}

/// Drive one connection: register with the hub, serve commands and tick
/// pushes, then unregister.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    let (notifier, mut ticks) = TickNotifier::channel();
    let handle = state.telemetry.register(Box::new(notifier)).await;
    info!(%handle, "client connected");

    let mut manager = ConnectionManager::new(
        Arc::clone(&state.telemetry),
        Arc::clone(&state.dictionary),
    );

    let reason = loop {
        tokio::select! {
            update = ticks.recv() => {
                let Some(update) = update else { break Closed::HubClosed };
                let mut failed = false;
                for message in manager.updates(&update) {
                    if send(&mut socket, &message).await.is_err() {
                        failed = true;
                        break;
                    }
                }
                if failed {
                    break Closed::SendFailed;
                }
                debug!(%handle, tick = update.tick, "pushed subscriptions");
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(response) = manager.handle_line(text.as_str()).await {
                            if send(&mut socket, &response).await.is_err() {
                                break Closed::SendFailed;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break Closed::SendFailed;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break Closed::Client,
                    Some(Err(e)) => {
                        debug!(%handle, "WebSocket error: {e}");
                        break Closed::Client;
                    }
                    _ => {
                        // Binary and pong frames carry no commands.
                    }
                }
            }
        }
    };

    let removed = state.telemetry.unregister(handle).await;
    info!(%handle, ?reason, removed, "client disconnected");
}

/// Serialize and send one message as a text frame.
async fn send(socket: &mut WebSocket, message: &ServerMessage) -> Result<(), axum::Error> {
    let json = match message.to_json() {
        Ok(j) => j,
        Err(e) => {
            warn!("Failed to serialize message: {e}");
            return Ok(());
        }
    };
    socket.send(Message::Text(json.into())).await
}
