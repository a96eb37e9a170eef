//! # hawser-hub
//!
//! The server half of the hawser realtime pubsub layer.
//!
//! - `WebSocket` gateway on axum: upgrade endpoint, per-connection
//!   reader/writer tasks, `?debugID=` socket labeling
//! - Subscription registry guarding both sides of the contract↔socket
//!   relation behind one lock
//! - Message dispatch with injected per-kind handler overrides
//! - Liveness sweep that pings every peer and drops the silent ones
//! - `broadcast` / `publish` fan-out primitives for the outer application
//! - Graceful shutdown via `tokio::signal` + `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod connection;
pub mod health;
pub mod hooks;
pub mod hub;
pub mod registry;
pub mod shutdown;

mod liveness;
mod server;
mod session;

pub use config::HubConfig;
pub use connection::Connection;
pub use hooks::{HubHook, HubHooks};
pub use hub::{BroadcastOpts, Hub};
