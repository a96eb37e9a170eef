//! Hub configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the pubsub hub.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HubConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Max inbound WebSocket message size in bytes.
    pub max_payload: usize,
    /// Interval between liveness sweeps in milliseconds; `0` disables them.
    pub ping_interval_ms: u64,
    /// Outbound queue capacity per connection.
    pub send_queue: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            max_payload: 6 * 1024 * 1024, // 6 MiB
            ping_interval_ms: 30_000,
            send_queue: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_host() {
        let cfg = HubConfig::default();
        assert_eq!(cfg.host, "127.0.0.1");
    }

    #[test]
    fn default_port_is_zero() {
        let cfg = HubConfig::default();
        assert_eq!(cfg.port, 0);
    }

    #[test]
    fn default_max_payload() {
        let cfg = HubConfig::default();
        assert_eq!(cfg.max_payload, 6 * 1024 * 1024);
    }

    #[test]
    fn default_ping_interval() {
        let cfg = HubConfig::default();
        assert_eq!(cfg.ping_interval_ms, 30_000);
    }

    #[test]
    fn default_send_queue() {
        let cfg = HubConfig::default();
        assert_eq!(cfg.send_queue, 256);
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = HubConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: HubConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.host, cfg.host);
        assert_eq!(back.port, cfg.port);
        assert_eq!(back.max_payload, cfg.max_payload);
        assert_eq!(back.ping_interval_ms, cfg.ping_interval_ms);
        assert_eq!(back.send_queue, cfg.send_queue);
    }

    #[test]
    fn custom_values() {
        let cfg = HubConfig {
            host: "0.0.0.0".into(),
            port: 9100,
            max_payload: 1024,
            ping_interval_ms: 0,
            send_queue: 8,
        };
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 9100);
        assert_eq!(cfg.max_payload, 1024);
        assert_eq!(cfg.ping_interval_ms, 0);
        assert_eq!(cfg.send_queue, 8);
    }
}
