//! Simulation clock: one tick of the telemetry engine.
//!
//! Each tick runs three phases in order:
//!
//! 1. **Simulate** -- apply every [`SimulationRule`] to the channel values.
//! 2. **Record** -- stamp one timestamp for the whole tick and append one
//!    [`Reading`] per channel to the history store. When a traffic channel
//!    is configured, the serialized size of each reading is added to it as
//!    soon as that reading is recorded.
//! 3. **Broadcast** -- fire every registered notifier once with the
//!    readings recorded in this tick.
//!
//! Timestamps are wall-clock milliseconds, clamped so a tick never carries
//! an earlier timestamp than the tick before it. History order therefore
//! always equals timestamp order.

use std::collections::BTreeMap;
use std::sync::Arc;

use cabin_types::{ChannelId, ChannelValue, Reading};
use tracing::{debug, warn};

use crate::hub::TickUpdate;
use crate::rules::SimulationRule;
use crate::telemetry::Telemetry;

/// Source of tick timestamps, in milliseconds since the Unix epoch.
pub type TimeSource = Box<dyn Fn() -> i64 + Send + Sync>;

/// Summary of a single tick's execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    /// The tick number that was executed (first tick is 1).
    pub tick: u64,
    /// Timestamp stamped on every reading of this tick.
    pub timestamp: i64,
    /// Number of readings appended.
    pub channels: usize,
    /// Notifiers invoked successfully.
    pub delivered: usize,
    /// Notifiers that failed.
    pub failed: usize,
}

/// Drives channel values forward and records them.
pub struct SimulationClock {
    telemetry: Arc<Telemetry>,
    rules: Vec<Box<dyn SimulationRule>>,
    traffic_channel: Option<ChannelId>,
    now: TimeSource,
    tick: u64,
    last_timestamp: i64,
}

impl SimulationClock {
    /// Create a clock over `telemetry`, stamping ticks with the wall clock.
    pub fn new(telemetry: Arc<Telemetry>) -> Self {
        Self {
            telemetry,
            rules: Vec::new(),
            traffic_channel: None,
            now: Box::new(|| chrono::Utc::now().timestamp_millis()),
            tick: 0,
            last_timestamp: i64::MIN,
        }
    }

    /// Add a rule; rules run in the order they are added.
    #[must_use]
    pub fn with_rule(mut self, rule: Box<dyn SimulationRule>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Accumulate the serialized size of every reading into `channel`.
    #[must_use]
    pub fn with_traffic_channel(mut self, channel: Option<ChannelId>) -> Self {
        self.traffic_channel = channel;
        self
    }

    /// Replace the timestamp source.
    #[must_use]
    pub fn with_time_source(mut self, now: TimeSource) -> Self {
        self.now = now;
        self
    }

    /// Number of ticks executed so far.
    pub const fn ticks(&self) -> u64 {
        self.tick
    }

    /// The shared state this clock drives.
    pub const fn telemetry(&self) -> &Arc<Telemetry> {
        &self.telemetry
    }

    /// Execute one tick.
    pub async fn tick(&mut self) -> TickSummary {
        self.tick = self.tick.saturating_add(1);
        let timestamp = (self.now)().max(self.last_timestamp);
        self.last_timestamp = timestamp;

        // --- Simulate ---
        let rules = &self.rules;
        let values = self
            .telemetry
            .with_state_mut(|state| {
                for rule in rules {
                    rule.apply(state);
                }
                state.to_map()
            })
            .await;

        // --- Record ---
        let mut traffic = 0.0_f64;
        let mut recorded = BTreeMap::new();
        let traffic_channel = self.traffic_channel.as_ref();
        self.telemetry
            .with_history_mut(|history| {
                for (id, value) in &values {
                    let mut value = value.clone();
                    if traffic_channel == Some(id) {
                        if let ChannelValue::Number(n) = &mut value {
                            *n += traffic;
                        }
                    }
                    let reading = Reading::new(timestamp, value);
                    traffic += serialized_len(&reading);
                    history.append(id, reading.clone());
                    recorded.insert(id.clone(), reading);
                }
            })
            .await;

        if let Some(channel) = traffic_channel {
            self.telemetry
                .with_state_mut(|state| match state.get_mut(channel.as_str()) {
                    Some(ChannelValue::Number(n)) => *n += traffic,
                    Some(ChannelValue::State(_)) => {
                        warn!(%channel, "traffic channel is not numeric, skipping");
                    }
                    None => {}
                })
                .await;
        }

        // --- Broadcast ---
        let update = TickUpdate::new(self.tick, recorded);
        let report = self.telemetry.fire_all(&update).await;

        let summary = TickSummary {
            tick: self.tick,
            timestamp,
            channels: values.len(),
            delivered: report.delivered,
            failed: report.failed,
        };
        debug!(
            tick = summary.tick,
            timestamp = summary.timestamp,
            channels = summary.channels,
            delivered = summary.delivered,
            failed = summary.failed,
            "tick complete"
        );
        summary
    }
}

impl core::fmt::Debug for SimulationClock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimulationClock")
            .field("rules", &self.rules.iter().map(|r| r.name()).collect::<Vec<_>>())
            .field("traffic_channel", &self.traffic_channel)
            .field("tick", &self.tick)
            .finish_non_exhaustive()
    }
}

/// Byte length of a reading's JSON form, as counted by traffic accounting.
fn serialized_len(reading: &Reading) -> f64 {
    let len = serde_json::to_string(reading).map_or(0, |json| json.len());
    f64::from(u32::try_from(len).unwrap_or(u32::MAX))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

    use super::*;
    use crate::config::{CabinConfig, ControlConfig, DecayConfig};
    use crate::hub::{Notifier, NotifyError};
    use crate::rules::LinearDecay;
    use crate::state::{CabinState, ControlToggle};

    fn reference_telemetry() -> Arc<Telemetry> {
        let config = CabinConfig::default();
        Arc::new(Telemetry::new(CabinState::new(config.simulation.channels)))
    }

    fn reference_clock(telemetry: &Arc<Telemetry>) -> SimulationClock {
        SimulationClock::new(Arc::clone(telemetry))
            .with_rule(Box::new(LinearDecay::from_config(&DecayConfig::default())))
            .with_traffic_channel(Some(ChannelId::from("comms.sent")))
    }

    fn number(value: Option<ChannelValue>) -> f64 {
        value.and_then(|v| v.as_number()).unwrap_or(f64::NAN)
    }

    #[tokio::test]
    async fn every_channel_gets_one_reading_per_tick() {
        let telemetry = reference_telemetry();
        let mut clock = reference_clock(&telemetry);

        for _ in 0..5 {
            clock.tick().await;
        }

        for id in ["sns.temp", "prop.aircon", "comms.recd", "comms.sent"] {
            let history = telemetry.history(id).await;
            assert_eq!(history.len(), 5, "channel {id}");
            assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        }
        assert_eq!(clock.ticks(), 5);
    }

    #[tokio::test]
    async fn timestamps_never_go_backwards() {
        let telemetry = reference_telemetry();
        let stamps = Arc::new(Mutex::new(vec![500_i64, 100, 900]));
        let source = Arc::clone(&stamps);
        let mut clock = reference_clock(&telemetry).with_time_source(Box::new(move || {
            let mut stamps = source.lock().unwrap();
            if stamps.is_empty() { 0 } else { stamps.remove(0) }
        }));

        let a = clock.tick().await.timestamp;
        let b = clock.tick().await.timestamp;
        let c = clock.tick().await.timestamp;
        assert_eq!((a, b, c), (500, 500, 900));

        let history = telemetry.history("sns.temp").await;
        let recorded: Vec<i64> = history.iter().map(|r| r.timestamp).collect();
        assert_eq!(recorded, vec![500, 500, 900]);
    }

    #[tokio::test]
    async fn aircon_scenario() {
        let telemetry = reference_telemetry();
        let mut clock = reference_clock(&telemetry);
        let toggle = ControlToggle::from_config(&ControlConfig::default());

        clock.tick().await;
        assert!((number(telemetry.value("sns.temp").await) - 22.0).abs() < 1e-9);
        let history = telemetry.history("sns.temp").await;
        assert_eq!(history.len(), 1);
        assert!((number(Some(history[0].value.clone())) - 22.0).abs() < 1e-9);

        assert_eq!(telemetry.toggle(&toggle).await, ChannelValue::state("ON"));
        clock.tick().await;
        assert!((number(telemetry.value("sns.temp").await) - 21.98).abs() < 1e-9);
        assert_eq!(telemetry.history_len("sns.temp").await, 2);
        let latest = telemetry.latest("sns.temp").await.unwrap();
        assert!((number(Some(latest.value)) - 21.98).abs() < 1e-9);
    }

    #[tokio::test]
    async fn decaying_channel_is_monotonic_and_non_negative() {
        let telemetry = reference_telemetry();
        telemetry
            .with_state_mut(|s| {
                s.set(ChannelId::from("sns.temp"), ChannelValue::Number(0.1));
                s.set(ChannelId::from("prop.aircon"), ChannelValue::state("ON"));
            })
            .await;
        let mut clock = reference_clock(&telemetry);

        for _ in 0..10 {
            clock.tick().await;
        }

        let history = telemetry.history("sns.temp").await;
        let values: Vec<f64> = history.iter().map(|r| number(Some(r.value.clone()))).collect();
        assert!(values.windows(2).all(|w| w[1] <= w[0]));
        assert!(values.iter().all(|v| *v >= 0.0));
        assert!(values.last().is_some_and(|v| v.abs() < 1e-12));
    }

    #[tokio::test]
    async fn traffic_channel_accumulates_serialized_sizes() {
        let telemetry = reference_telemetry();
        let mut clock = reference_clock(&telemetry).with_time_source(Box::new(|| 1_000));

        clock.tick().await;

        // Channel id order: comms.recd, comms.sent, prop.aircon, sns.temp.
        let recd = Reading::new(1_000, ChannelValue::Number(0.0));
        let recd_len = serde_json::to_string(&recd).unwrap().len();

        let sent = telemetry.latest("comms.sent").await.unwrap();
        let expected = f64::from(u32::try_from(recd_len).unwrap());
        assert!((number(Some(sent.value.clone())) - expected).abs() < 1e-9);

        let mut total = 0_usize;
        for id in ["comms.recd", "comms.sent", "prop.aircon", "sns.temp"] {
            let reading = telemetry.latest(id).await.unwrap();
            total += serde_json::to_string(&reading).unwrap().len();
        }
        let live = number(telemetry.value("comms.sent").await);
        assert!((live - f64::from(u32::try_from(total).unwrap())).abs() < 1e-9);
    }

    #[tokio::test]
    async fn no_traffic_channel_leaves_counters_alone() {
        let telemetry = reference_telemetry();
        let mut clock = SimulationClock::new(Arc::clone(&telemetry));

        clock.tick().await;
        clock.tick().await;

        assert!(number(telemetry.value("comms.sent").await).abs() < 1e-12);
    }

    struct Counter {
        hits: Arc<AtomicU64>,
        last_tick: Arc<AtomicI64>,
        last_readings: Arc<Mutex<usize>>,
    }

    impl Notifier for Counter {
        fn notify(&self, update: &TickUpdate) -> Result<(), NotifyError> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            self.last_tick.store(i64::try_from(update.tick).unwrap_or(-1), Ordering::SeqCst);
            *self.last_readings.lock().unwrap() = update.readings.len();
            Ok(())
        }
    }

    #[tokio::test]
    async fn broadcast_fires_once_per_tick_after_recording() {
        let telemetry = reference_telemetry();
        let hits = Arc::new(AtomicU64::new(0));
        let last_tick = Arc::new(AtomicI64::new(0));
        let last_readings = Arc::new(Mutex::new(0));
        telemetry
            .register(Box::new(Counter {
                hits: Arc::clone(&hits),
                last_tick: Arc::clone(&last_tick),
                last_readings: Arc::clone(&last_readings),
            }))
            .await;
        let mut clock = reference_clock(&telemetry);

        let summary = clock.tick().await;
        clock.tick().await;

        assert_eq!(summary.delivered, 1);
        assert_eq!(summary.channels, 4);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(last_tick.load(Ordering::SeqCst), 2);
        assert_eq!(*last_readings.lock().unwrap(), 4);
    }
}
