//! # hawser-client
//!
//! Reconnecting WebSocket client for the hawser pubsub layer.
//!
//! One actor task owns the socket and all state; a cloneable [`Client`]
//! handle posts commands to it and an event stream reports what happened:
//!
//! - Sub/unsub intent tracking with replay of unacknowledged requests after
//!   a reconnect
//! - Randomized exponential backoff between connection attempts, with a
//!   configurable set of close codes that stop reconnection for good
//! - Handshake and ping-liveness deadlines
//! - Injected reachability signals (`network_online` / `network_offline`)
//! - Per-kind message hooks replacing the default handling
//!
//! ```no_run
//! use hawser_client::{Client, ClientOptions, MessageHooks};
//!
//! # async fn demo() {
//! let (client, mut events) = Client::spawn(
//!     "http://127.0.0.1:4600/ws",
//!     ClientOptions::default(),
//!     MessageHooks::new(),
//! );
//! client.sub("contract-1".into()).unwrap();
//! while let Some(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! # }
//! ```

#![deny(unsafe_code)]

pub mod client;
pub mod errors;
pub mod events;
pub mod hooks;
pub mod options;

mod ledger;
mod timers;

pub use client::{Client, ClientSnapshot};
pub use errors::ClientError;
pub use events::ClientEvent;
pub use hooks::{MessageHook, MessageHooks};
pub use options::ClientOptions;
