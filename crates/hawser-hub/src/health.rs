//! Health snapshot served over HTTP.

use serde::{Deserialize, Serialize};

use crate::hub::Hub;

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process is serving.
    pub status: String,
    /// Seconds since the hub was created.
    pub uptime_secs: u64,
    /// Live WebSocket connections.
    pub connections: usize,
    /// Contracts with at least one subscriber.
    pub contracts: usize,
}

impl HealthResponse {
    /// Snapshot the hub's current state.
    #[must_use]
    pub fn from_hub(hub: &Hub) -> Self {
        Self {
            status: "ok".to_string(),
            uptime_secs: hub.uptime_secs(),
            connections: hub.connection_count(),
            contracts: hub.contract_count(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
