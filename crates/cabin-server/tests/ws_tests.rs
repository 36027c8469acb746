//! End-to-end tests for the `WebSocket` client protocol.
//!
//! Each test serves the router on an ephemeral loopback port and talks to
//! it with a real `tokio-tungstenite` client. Ticks are driven by hand
//! through a [`SimulationClock`] sharing the server's telemetry.

#![allow(clippy::unwrap_used)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use cabin_core::config::{CabinConfig, DecayConfig};
use cabin_core::rules::LinearDecay;
use cabin_core::state::CabinState;
use cabin_core::{Dictionary, SimulationClock, Telemetry};
use cabin_server::state::AppState;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

async fn start() -> (SocketAddr, Arc<AppState>, SimulationClock) {
    let telemetry = Arc::new(Telemetry::new(CabinState::new(
        CabinConfig::default().simulation.channels,
    )));
    let dictionary = Arc::new(Dictionary::from_value(serde_json::json!({
        "name": "Cabin",
        "measurements": [{"key": "sns.temp", "name": "Temperature"}]
    })));
    let state = Arc::new(AppState::new(Arc::clone(&telemetry), dictionary));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(cabin_server::serve(listener, Arc::clone(&state)));

    let clock = SimulationClock::new(telemetry)
        .with_rule(Box::new(LinearDecay::from_config(&DecayConfig::default())));
    (addr, state, clock)
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/"))
        .await
        .unwrap();
    client
}

async fn send(client: &mut Client, line: &str) {
    client.send(Message::text(line)).await.unwrap();
}

async fn recv_json(client: &mut Client) -> Value {
    loop {
        let msg = tokio::time::timeout(RECV_TIMEOUT, client.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// Round-trip a `history` request so every command sent before it has
/// been processed by the server.
async fn sync(client: &mut Client) {
    send(client, "history sync.marker").await;
    let json = recv_json(client).await;
    assert_eq!(json["type"], "history");
    assert_eq!(json["id"], "sync.marker");
}

async fn wait_for_connections(state: &AppState, expected: usize) {
    let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
    while state.telemetry.connection_count().await != expected {
        assert!(
            tokio::time::Instant::now() < deadline,
            "connection count never reached {expected}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn dictionary_request() {
    let (addr, _state, _clock) = start().await;
    let mut client = connect(addr).await;

    send(&mut client, "dictionary").await;
    let json = recv_json(&mut client).await;

    assert_eq!(json["type"], "dictionary");
    assert_eq!(json["value"]["name"], "Cabin");
    assert_eq!(json["value"]["measurements"][0]["key"], "sns.temp");
}

#[tokio::test]
async fn history_of_unwritten_channel_is_empty_array() {
    let (addr, _state, _clock) = start().await;
    let mut client = connect(addr).await;

    send(&mut client, "history x").await;
    let json = recv_json(&mut client).await;

    assert_eq!(json["type"], "history");
    assert_eq!(json["id"], "x");
    assert_eq!(json["value"], serde_json::json!([]));
}

#[tokio::test]
async fn subscription_pushes_follow_subscribe_and_unsubscribe() {
    let (addr, _state, mut clock) = start().await;
    let mut client = connect(addr).await;

    send(&mut client, "subscribe sns.temp").await;
    send(&mut client, "subscribe prop.aircon").await;
    sync(&mut client).await;

    clock.tick().await;
    let first = recv_json(&mut client).await;
    let second = recv_json(&mut client).await;
    assert_eq!(first["type"], "data");
    assert_eq!(first["id"], "sns.temp");
    assert_eq!(first["value"]["value"], 22.0);
    assert!(first["value"]["timestamp"].is_i64());
    assert_eq!(second["id"], "prop.aircon");
    assert_eq!(second["value"]["value"], "OFF");

    send(&mut client, "unsubscribe sns.temp").await;
    sync(&mut client).await;

    clock.tick().await;
    let only = recv_json(&mut client).await;
    assert_eq!(only["id"], "prop.aircon");

    // Nothing else queued for this tick.
    sync(&mut client).await;
}

#[tokio::test]
async fn back_to_back_ticks_each_push_their_own_reading() {
    let (addr, _state, clock) = start().await;
    let next = Arc::new(AtomicI64::new(1_000));
    let source = Arc::clone(&next);
    let mut clock =
        clock.with_time_source(Box::new(move || source.fetch_add(1, Ordering::SeqCst)));
    let mut client = connect(addr).await;

    send(&mut client, "subscribe sns.temp").await;
    sync(&mut client).await;

    clock.tick().await;
    clock.tick().await;

    let first = recv_json(&mut client).await;
    let second = recv_json(&mut client).await;
    let stamps = [first["value"]["timestamp"].as_i64(), second["value"]["timestamp"].as_i64()];
    assert_eq!(stamps, [Some(1_000), Some(1_001)]);
    assert_eq!(next.load(Ordering::SeqCst), 1_002);
}

#[tokio::test]
async fn unrecognized_command_gets_no_response() {
    let (addr, _state, _clock) = start().await;
    let mut client = connect(addr).await;

    send(&mut client, "frobnicate abc").await;
    send(&mut client, "subscribe").await;
    // The next message must be the marker reply, not a response to the above.
    sync(&mut client).await;
}

#[tokio::test]
async fn history_after_ticks_returns_every_reading() {
    let (addr, _state, mut clock) = start().await;
    clock.tick().await;
    clock.tick().await;
    clock.tick().await;

    let mut client = connect(addr).await;
    send(&mut client, "history sns.temp").await;
    let json = recv_json(&mut client).await;

    let readings = json["value"].as_array().unwrap();
    assert_eq!(readings.len(), 3);
    let stamps: Vec<i64> = readings.iter().map(|r| r["timestamp"].as_i64().unwrap()).collect();
    assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn disconnect_unregisters_and_others_keep_receiving() {
    let (addr, state, mut clock) = start().await;

    let mut leaving = connect(addr).await;
    let mut staying = connect(addr).await;
    send(&mut leaving, "subscribe sns.temp").await;
    send(&mut staying, "subscribe sns.temp").await;
    sync(&mut leaving).await;
    sync(&mut staying).await;
    wait_for_connections(&state, 2).await;

    leaving.close(None).await.unwrap();
    drop(leaving);
    wait_for_connections(&state, 1).await;

    let summary = clock.tick().await;
    assert_eq!(summary.delivered, 1);
    assert_eq!(summary.failed, 0);

    let json = recv_json(&mut staying).await;
    assert_eq!(json["type"], "data");
    assert_eq!(json["id"], "sns.temp");
}
