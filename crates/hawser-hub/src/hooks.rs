//! Injected handler overrides keyed by message kind.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use hawser_core::message::{Message, MessageKind};

use crate::connection::Connection;
use crate::hub::Hub;

/// A server-side message handler override.
///
/// Registering a hook for a kind replaces the hub's default handling of that
/// kind, including for kinds the hub would otherwise reject. Failures are
/// caught by the dispatcher: the offending message is echoed back inside an
/// `error` frame and the connection is closed. A hook can never take the hub
/// down.
#[async_trait]
pub trait HubHook: Send + Sync {
    /// Handle one inbound message on behalf of the hub.
    async fn handle(
        &self,
        hub: &Hub,
        connection: &Arc<Connection>,
        message: &Message,
    ) -> anyhow::Result<()>;
}

/// Handler override map supplied at hub construction.
pub type HubHooks = HashMap<MessageKind, Arc<dyn HubHook>>;
