//! Operator console: toggles the control channel from standard input.
//!
//! Every line read (an empty line from pressing Enter is enough) flips the
//! control channel between its two states. The console is an operational
//! affordance, not part of the client protocol; when stdin closes it stops
//! and the service keeps running.

use std::sync::Arc;

use cabin_core::Telemetry;
use cabin_core::state::ControlToggle;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};

/// Read lines from `input` and toggle the control for each one.
///
/// Returns the number of toggles applied when `input` is exhausted.
pub async fn run_console<R>(input: R, telemetry: Arc<Telemetry>, toggle: ControlToggle) -> u64
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut toggles: u64 = 0;

    loop {
        match lines.next_line().await {
            Ok(Some(_)) => {
                let value = telemetry.toggle(&toggle).await;
                toggles = toggles.saturating_add(1);
                info!(channel = %toggle.channel, %value, "control channel toggled");
            }
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "operator console read failed, console disabled");
                break;
            }
        }
    }

    info!(toggles, "operator console closed");
    toggles
}
