//! Client tuning knobs.

use hawser_core::backoff::{
    DEFAULT_MAX_RECONNECTION_DELAY_MS, DEFAULT_MAX_RETRIES, DEFAULT_MIN_RECONNECTION_DELAY_MS,
    DEFAULT_RECONNECTION_DELAY_GROW_FACTOR,
};
use serde::{Deserialize, Serialize};

/// Configuration for [`crate::Client`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientOptions {
    /// Handshake deadline in milliseconds (default `5_000`, 0 disables).
    ///
    /// A connect attempt that has not completed in time is abandoned and
    /// treated as a close with code 4000.
    pub timeout_ms: u64,
    /// Liveness deadline in milliseconds (default `45_000`, 0 disables).
    ///
    /// Reset whenever a `ping` arrives; firing closes the socket.
    pub ping_timeout_ms: u64,
    /// Backoff floor in milliseconds (default `500`).
    pub min_reconnection_delay_ms: u64,
    /// Backoff cap in milliseconds (default `60_000`).
    pub max_reconnection_delay_ms: u64,
    /// Backoff growth per failed attempt (default `2.0`).
    pub reconnection_delay_grow_factor: f64,
    /// Attempts before giving up for good (default `10`).
    pub max_retries: u32,
    /// Reconnect after a retryable close (default `true`).
    pub reconnect_on_disconnection: bool,
    /// Reconnect when the host signals the network came back (default `true`).
    pub reconnect_on_online: bool,
    /// Reconnect after a connection-timeout close, code 4000 (default `false`).
    pub reconnect_on_timeout: bool,
    /// Suppress the connect attempt at spawn (default `false`).
    pub manual: bool,
    /// Close codes that permanently disable reconnection
    /// (default `[1000, 1002, 1003, 1007, 1008]`).
    pub fatal_close_codes: Vec<u16>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            ping_timeout_ms: 45_000,
            min_reconnection_delay_ms: DEFAULT_MIN_RECONNECTION_DELAY_MS,
            max_reconnection_delay_ms: DEFAULT_MAX_RECONNECTION_DELAY_MS,
            reconnection_delay_grow_factor: DEFAULT_RECONNECTION_DELAY_GROW_FACTOR,
            max_retries: DEFAULT_MAX_RETRIES,
            reconnect_on_disconnection: true,
            reconnect_on_online: true,
            reconnect_on_timeout: false,
            manual: false,
            fatal_close_codes: vec![1000, 1002, 1003, 1007, 1008],
        }
    }
}

impl ClientOptions {
    /// Whether a close with this code rules out any further reconnection.
    #[must_use]
    pub fn is_fatal_close_code(&self, code: u16) -> bool {
        self.fatal_close_codes.contains(&code)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_deadlines() {
        let opts = ClientOptions::default();
        assert_eq!(opts.timeout_ms, 5_000);
        assert_eq!(opts.ping_timeout_ms, 45_000);
    }

    #[test]
    fn default_backoff_envelope() {
        let opts = ClientOptions::default();
        assert_eq!(opts.min_reconnection_delay_ms, 500);
        assert_eq!(opts.max_reconnection_delay_ms, 60_000);
        assert!((opts.reconnection_delay_grow_factor - 2.0).abs() < f64::EPSILON);
        assert_eq!(opts.max_retries, 10);
    }

    #[test]
    fn default_reconnect_policy() {
        let opts = ClientOptions::default();
        assert!(opts.reconnect_on_disconnection);
        assert!(opts.reconnect_on_online);
        assert!(!opts.reconnect_on_timeout);
        assert!(!opts.manual);
    }

    #[test]
    fn default_fatal_close_codes() {
        let opts = ClientOptions::default();
        assert_eq!(opts.fatal_close_codes, vec![1000, 1002, 1003, 1007, 1008]);
        assert!(opts.is_fatal_close_code(1000));
        assert!(opts.is_fatal_close_code(1008));
        assert!(!opts.is_fatal_close_code(1001));
        assert!(!opts.is_fatal_close_code(4000));
    }

    #[test]
    fn fatal_close_codes_are_configurable() {
        let opts = ClientOptions {
            fatal_close_codes: vec![4999],
            ..ClientOptions::default()
        };
        assert!(opts.is_fatal_close_code(4999));
        assert!(!opts.is_fatal_close_code(1000));
    }

    #[test]
    fn serde_roundtrip() {
        let opts = ClientOptions::default();
        let json = serde_json::to_string(&opts).unwrap();
        let back: ClientOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back.timeout_ms, opts.timeout_ms);
        assert_eq!(back.fatal_close_codes, opts.fatal_close_codes);
    }
}
