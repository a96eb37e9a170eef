//! Per-kind handler overrides for inbound messages.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use hawser_core::message::{Message, MessageKind};

/// Replaces the client's default handling for one message kind.
///
/// A hook error is caught and surfaced as
/// [`ClientEvent::Error`](crate::ClientEvent::Error); it never tears down
/// the connection.
#[async_trait]
pub trait MessageHook: Send + Sync {
    /// Handle one inbound message of the hooked kind.
    async fn handle(&self, message: &Message) -> anyhow::Result<()>;
}

/// Hook table, keyed by message kind. A present entry replaces the default
/// for that kind only.
pub type MessageHooks = HashMap<MessageKind, Arc<dyn MessageHook>>;
