//! Cancellable deadlines driven from the actor's `select!` loop.

use tokio::time::{Duration, Instant, sleep_until};

/// A single re-armable deadline.
///
/// `fired()` is recreated on every loop turn, so it is safe to cancel or
/// re-arm from another branch of the same `select!`.
#[derive(Debug, Default)]
pub(crate) struct Deadline(Option<Instant>);

impl Deadline {
    /// Arm (or re-arm) the deadline `after` from now.
    pub(crate) fn arm(&mut self, after: Duration) {
        self.0 = Some(Instant::now() + after);
    }

    pub(crate) fn cancel(&mut self) {
        self.0 = None;
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.0.is_some()
    }

    /// Resolves when the deadline passes; pends forever while disarmed.
    pub(crate) async fn fired(&self) {
        match self.0 {
            Some(at) => sleep_until(at).await,
            None => std::future::pending().await,
        }
    }
}

/// The client's three deadlines.
#[derive(Debug, Default)]
pub(crate) struct TimerSet {
    /// Handshake must complete before this fires.
    pub(crate) connect: Deadline,
    /// A ping must arrive before this fires.
    pub(crate) ping: Deadline,
    /// The next reconnection attempt starts when this fires.
    pub(crate) reconnect: Deadline,
}

impl TimerSet {
    pub(crate) fn clear_all(&mut self) {
        self.connect.cancel();
        self.ping.cancel();
        self.reconnect.cancel();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
