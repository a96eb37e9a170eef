//! # hawser-core
//!
//! Shared protocol foundation for the hawser realtime pubsub layer.
//!
//! This crate provides the vocabulary both the hub and the client speak:
//!
//! - **Wire messages**: the closed [`message::Message`] enum, its JSON
//!   envelope codec, and the protocol error taxonomy
//! - **Branded IDs**: [`ids::ContractId`] and [`ids::SocketId`] newtypes
//! - **Backoff**: randomized exponential reconnection delay math
//! - **Logging**: `tracing` subscriber initialization shared by binaries and tests

#![deny(unsafe_code)]

pub mod backoff;
pub mod ids;
pub mod logging;
pub mod message;
