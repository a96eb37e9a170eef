//! Periodic ping sweep that drops unresponsive connections.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::hub::Hub;

/// Spawn the sweep loop. Each tick pings every open connection and drops the
/// ones that never answered the previous ping.
pub(crate) fn spawn_ping_sweep(
    hub: Arc<Hub>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // Skip the immediate first tick.
        let _ = ticker.tick().await;
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("ping sweep stopped");
                    break;
                }
                _ = ticker.tick() => hub.ping_sweep(),
            }
        }
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
