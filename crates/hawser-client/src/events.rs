//! Events the client reports to its host application.

use serde_json::Value;

/// Lifecycle and data events, delivered in order over the event channel.
///
/// The channel closing is itself a signal: the actor is gone and the handle
/// is dead (after `destroy()` or retry exhaustion).
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// The socket opened and pending subscriptions were replayed.
    Connected {
        /// False on the first-ever open, true on every reconnect.
        resumed: bool,
    },
    /// The socket closed.
    Disconnected {
        /// Transport close code (1006 when the peer vanished without one).
        code: u16,
        /// Close reason, possibly empty.
        reason: String,
    },
    /// A new entry for a subscribed contract log.
    Entry {
        /// Opaque entry payload.
        data: Value,
    },
    /// Something went wrong that did not fit a lifecycle transition.
    Error {
        /// Human-readable description.
        message: String,
    },
    /// A reconnection attempt was scheduled.
    ReconnectionScheduled {
        /// Backoff delay until the attempt.
        delay_ms: u64,
        /// 1-based attempt number.
        attempt: u32,
    },
    /// The scheduled delay elapsed and a connect is starting.
    ReconnectionAttempt,
    /// A reconnect completed (paired with `Connected { resumed: true }`).
    ReconnectionSucceeded,
    /// Retries are exhausted; the client destroyed itself.
    ReconnectionFailed,
}
