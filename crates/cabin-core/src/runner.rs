//! Periodic tick loop.
//!
//! [`run_clock`] ticks once immediately and then on a fixed interval until
//! the supplied shutdown future resolves. A tick that overruns its slot
//! delays the schedule instead of triggering a burst of catch-up ticks.

use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::clock::SimulationClock;

/// Run the clock until `shutdown` completes.
///
/// Returns the number of ticks executed by this call.
pub async fn run_clock<F>(clock: &mut SimulationClock, interval: Duration, shutdown: F) -> u64
where
    F: Future<Output = ()>,
{
    let mut timer = tokio::time::interval(interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let start = clock.ticks();
    info!(interval_ms = interval.as_millis(), "Simulation clock starting");

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            _ = timer.tick() => {
                clock.tick().await;
            }
        }
    }

    let executed = clock.ticks().saturating_sub(start);
    info!(ticks = executed, "Simulation clock stopped");
    executed
}
