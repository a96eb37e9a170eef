//! The hub: connection map, subscription registry, dispatch, and fan-out.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use dashmap::DashMap;
use hawser_core::ids::{ContractId, SocketId};
use hawser_core::message::{
    self, HANDLER_FAILURE_CLOSE_CODE, Message, ProtoError, RequestKind,
};
use metrics::{counter, gauge};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::HubConfig;
use crate::connection::Connection;
use crate::hooks::HubHooks;
use crate::registry::SubscriberRegistry;
use crate::shutdown::ShutdownCoordinator;

/// Delivery targets for [`Hub::broadcast`].
#[derive(Clone, Copy, Debug, Default)]
pub struct BroadcastOpts<'a> {
    /// Restrict delivery to these sockets; `None` means every connection.
    pub to: Option<&'a [SocketId]>,
    /// Skip this socket even when it appears in the target set.
    pub except: Option<&'a SocketId>,
}

/// What the reader loop should do after a frame was dispatched.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Disposition {
    /// Keep reading.
    Continue,
    /// Drop the connection without a close handshake.
    Terminate,
}

/// The server half of the pubsub layer.
///
/// Owns the connection map, the subscription registry, and the handler
/// override map. One hub serves many sockets; per-socket state lives in
/// [`Connection`].
pub struct Hub {
    config: HubConfig,
    connections: DashMap<SocketId, Arc<Connection>>,
    registry: SubscriberRegistry,
    hooks: HubHooks,
    socket_seq: AtomicU64,
    shutdown: Arc<ShutdownCoordinator>,
    start_time: Instant,
}

impl Hub {
    /// Create a hub with default handlers only.
    #[must_use]
    pub fn new(config: HubConfig) -> Self {
        Self::with_hooks(config, HubHooks::new())
    }

    /// Create a hub with handler overrides merged over the defaults.
    #[must_use]
    pub fn with_hooks(config: HubConfig, hooks: HubHooks) -> Self {
        Self {
            config,
            connections: DashMap::new(),
            registry: SubscriberRegistry::new(),
            hooks,
            socket_seq: AtomicU64::new(0),
            shutdown: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
        }
    }

    /// Configuration the hub was built with.
    #[must_use]
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Coordinator covering the listener, the sweep, and every connection.
    #[must_use]
    pub fn shutdown_coordinator(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Number of live connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of contracts with at least one subscriber.
    #[must_use]
    pub fn contract_count(&self) -> usize {
        self.registry.contract_count()
    }

    /// Snapshot of the sockets currently subscribed to a contract.
    #[must_use]
    pub fn subscribers_of(&self, contract_id: &ContractId) -> Vec<SocketId> {
        self.registry.subscribers_of(contract_id)
    }

    /// Snapshot of the contracts a socket is currently subscribed to.
    #[must_use]
    pub fn contracts_of(&self, socket_id: &SocketId) -> Vec<ContractId> {
        self.registry.contracts_of(socket_id)
    }

    pub(crate) fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Mint the next socket identifier.
    pub(crate) fn mint_socket_id(&self, debug_id: Option<&str>) -> SocketId {
        SocketId::from_parts(self.socket_seq.fetch_add(1, Ordering::Relaxed), debug_id)
    }

    pub(crate) fn insert_connection(&self, connection: Arc<Connection>) {
        info!(socket_id = %connection.id, "socket connected");
        counter!("hub_connections_total").increment(1);
        gauge!("hub_connections_active").increment(1.0);
        let _ = self.connections.insert(connection.id.clone(), connection);
    }

    /// Close cleanup: unlink the socket everywhere and tell the peers that
    /// shared a contract with it.
    pub(crate) fn remove_connection(&self, socket_id: &SocketId) {
        let Some((_, connection)) = self.connections.remove(socket_id) else {
            return;
        };
        connection.mark_closed();
        gauge!("hub_connections_active").decrement(1.0);
        for (contract_id, remaining) in self.registry.drop_socket(socket_id) {
            let note = Message::unsub_notification(contract_id, socket_id.clone());
            self.notify(&note, BroadcastOpts {
                to: Some(&remaining),
                except: None,
            });
        }
        info!(socket_id = %socket_id, "socket disconnected");
    }

    /// Send a message to a set of connections.
    ///
    /// Serializes once, skips connections that are not open, skips `except`,
    /// and returns how many peers the frame was queued for.
    pub fn broadcast(
        &self,
        message: &Message,
        opts: BroadcastOpts<'_>,
    ) -> Result<usize, ProtoError> {
        let frame = Arc::new(message.encode()?);
        let mut sent = 0usize;
        match opts.to {
            Some(targets) => {
                for socket_id in targets {
                    if opts.except == Some(socket_id) {
                        continue;
                    }
                    if let Some(connection) = self.connections.get(socket_id) {
                        if connection.is_open() && connection.send(frame.clone()) {
                            sent += 1;
                        }
                    }
                }
            }
            None => {
                for entry in self.connections.iter() {
                    let connection = entry.value();
                    if opts.except == Some(&connection.id) {
                        continue;
                    }
                    if connection.is_open() && connection.send(frame.clone()) {
                        sent += 1;
                    }
                }
            }
        }
        counter!("hub_broadcast_frames_total").increment(sent as u64);
        Ok(sent)
    }

    /// Deliver a new log entry to the current subscribers of a contract.
    ///
    /// This is the primitive the outer application calls when a log grows.
    /// Returns how many subscribers the entry was queued for.
    pub fn publish(&self, contract_id: &ContractId, entry: Value) -> Result<usize, ProtoError> {
        let to = self.registry.subscribers_of(contract_id);
        self.broadcast(&Message::Entry(entry), BroadcastOpts {
            to: Some(&to),
            except: None,
        })
    }

    /// Route one raw inbound frame from `connection`.
    pub(crate) async fn dispatch(&self, connection: &Arc<Connection>, raw: &str) -> Disposition {
        let message = match message::parse(raw) {
            Ok(message) => message,
            Err(e @ ProtoError::UnknownType(_)) => {
                warn!(socket_id = %connection.id, error = %e, "terminating connection");
                counter!("hub_protocol_errors_total").increment(1);
                return Disposition::Terminate;
            }
            Err(e) => {
                error!(socket_id = %connection.id, error = %e, "terminating connection");
                counter!("hub_parse_errors_total").increment(1);
                return Disposition::Terminate;
            }
        };
        connection.mark_active();
        let kind = message.kind();
        counter!("hub_messages_total", "kind" => kind.as_str()).increment(1);

        if let Some(hook) = self.hooks.get(&kind) {
            if let Err(e) = hook.handle(self, connection, &message).await {
                error!(
                    socket_id = %connection.id,
                    kind = %kind,
                    error = %e,
                    "message handler failed"
                );
                self.reject(connection, message);
            }
            return Disposition::Continue;
        }

        match message {
            // Activity was already recorded; a pong needs nothing more.
            Message::Pong(_) => Disposition::Continue,
            // Reserved hook point.
            Message::Pub(_) => Disposition::Continue,
            Message::Sub(info) => {
                self.handle_sub(connection, info.contract_id);
                Disposition::Continue
            }
            Message::Unsub(info) => {
                self.handle_unsub(connection, info.contract_id);
                Disposition::Continue
            }
            other => {
                warn!(
                    socket_id = %connection.id,
                    kind = %other.kind(),
                    "no handler for message kind, terminating connection"
                );
                counter!("hub_protocol_errors_total").increment(1);
                Disposition::Terminate
            }
        }
    }

    /// Idempotent subscribe. The acknowledgment goes out whether or not the
    /// subscription was new; the membership notification goes to the other
    /// subscribers only.
    fn handle_sub(&self, connection: &Arc<Connection>, contract_id: ContractId) {
        if self.registry.subscribe(&connection.id, &contract_id) {
            let peers = self.registry.subscribers_of(&contract_id);
            let note = Message::sub_notification(contract_id.clone(), connection.id.clone());
            self.notify(&note, BroadcastOpts {
                to: Some(&peers),
                except: Some(&connection.id),
            });
            debug!(socket_id = %connection.id, contract_id = %contract_id, "subscribed");
        }
        self.send_to(connection, &Message::ack(RequestKind::Sub, contract_id));
    }

    /// Idempotent unsubscribe, mirroring [`handle_sub`](Self::handle_sub).
    fn handle_unsub(&self, connection: &Arc<Connection>, contract_id: ContractId) {
        if self.registry.unsubscribe(&connection.id, &contract_id) {
            let peers = self.registry.subscribers_of(&contract_id);
            let note = Message::unsub_notification(contract_id.clone(), connection.id.clone());
            self.notify(&note, BroadcastOpts {
                to: Some(&peers),
                except: Some(&connection.id),
            });
            debug!(socket_id = %connection.id, contract_id = %contract_id, "unsubscribed");
        }
        self.send_to(connection, &Message::ack(RequestKind::Unsub, contract_id));
    }

    /// Echo the failing message back inside an `error` frame, then close.
    fn reject(&self, connection: &Arc<Connection>, original: Message) {
        counter!("hub_handler_failures_total").increment(1);
        let response = Message::Error(Box::new(original));
        match response.encode() {
            Ok(frame) => {
                let _ = connection.send(Arc::new(frame));
            }
            Err(e) => {
                warn!(socket_id = %connection.id, error = %e, "failed to encode error response");
            }
        }
        if !connection.close(HANDLER_FAILURE_CLOSE_CODE, "handler error") {
            connection.terminate();
        }
    }

    /// One liveness pass over every connection.
    ///
    /// A connection that was pinged and stayed silent since is dropped.
    /// Everyone else that is still open gets a fresh ping carrying the
    /// current timestamp.
    pub fn ping_sweep(&self) {
        let now = chrono::Utc::now().timestamp_millis();
        let frame = match Message::Ping(now).encode() {
            Ok(frame) => Arc::new(frame),
            Err(e) => {
                warn!(error = %e, "failed to encode ping");
                return;
            }
        };
        for entry in self.connections.iter() {
            let connection = entry.value();
            if connection.is_unresponsive() {
                info!(socket_id = %connection.id, "no reply since last sweep, dropping connection");
                counter!("hub_ping_terminations_total").increment(1);
                connection.terminate();
            } else if connection.is_open() && connection.send(frame.clone()) {
                connection.mark_pinged();
            }
        }
    }

    fn notify(&self, message: &Message, opts: BroadcastOpts<'_>) {
        if let Err(e) = self.broadcast(message, opts) {
            warn!(error = %e, "failed to broadcast notification");
        }
    }

    /// Encode and queue one frame for a single connection.
    fn send_to(&self, connection: &Arc<Connection>, message: &Message) {
        match message.encode() {
            Ok(frame) => {
                if !connection.send(Arc::new(frame)) {
                    debug!(socket_id = %connection.id, "outbound queue full, dropping frame");
                }
            }
            Err(e) => {
                warn!(socket_id = %connection.id, error = %e, "failed to encode frame");
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Outbound;
    use crate::hooks::HubHook;
    use async_trait::async_trait;
    use hawser_core::message::MessageKind;
    use serde_json::json;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    fn make_hub() -> Hub {
        Hub::new(HubConfig::default())
    }

    fn attach(hub: &Hub, debug_id: Option<&str>) -> (Arc<Connection>, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(32);
        let connection = Arc::new(Connection::new(
            hub.mint_socket_id(debug_id),
            tx,
            CancellationToken::new(),
        ));
        hub.insert_connection(connection.clone());
        (connection, rx)
    }

    fn next_frame(rx: &mut mpsc::Receiver<Outbound>) -> serde_json::Value {
        match rx.try_recv().expect("expected a queued item") {
            Outbound::Frame(frame) => serde_json::from_str(&frame).unwrap(),
            other => panic!("expected frame, got {other:?}"),
        }
    }

    fn next_close(rx: &mut mpsc::Receiver<Outbound>) -> (u16, String) {
        match rx.try_recv().expect("expected a queued item") {
            Outbound::Close(code, reason) => (code, reason),
            other => panic!("expected close, got {other:?}"),
        }
    }

    fn assert_no_frame(rx: &mut mpsc::Receiver<Outbound>) {
        assert!(rx.try_recv().is_err(), "expected no queued frames");
    }

    struct FailingHook;

    #[async_trait]
    impl HubHook for FailingHook {
        async fn handle(
            &self,
            _hub: &Hub,
            _connection: &Arc<Connection>,
            _message: &Message,
        ) -> anyhow::Result<()> {
            anyhow::bail!("boom")
        }
    }

    struct RecordingHook {
        seen: parking_lot::Mutex<Vec<MessageKind>>,
    }

    #[async_trait]
    impl HubHook for RecordingHook {
        async fn handle(
            &self,
            _hub: &Hub,
            _connection: &Arc<Connection>,
            message: &Message,
        ) -> anyhow::Result<()> {
            self.seen.lock().push(message.kind());
            Ok(())
        }
    }

    #[test]
    fn mint_socket_id_is_monotonic() {
        let hub = make_hub();
        assert_eq!(hub.mint_socket_id(None).as_str(), "0");
        assert_eq!(hub.mint_socket_id(None).as_str(), "1");
        assert_eq!(hub.mint_socket_id(Some("alice")).as_str(), "2-alice");
    }

    #[tokio::test]
    async fn sub_is_acknowledged_even_when_duplicate() {
        let hub = make_hub();
        let (conn, mut rx) = attach(&hub, None);
        let raw = r#"{"type":"sub","data":{"contractID":"c1"}}"#;

        assert_eq!(hub.dispatch(&conn, raw).await, Disposition::Continue);
        assert_eq!(hub.dispatch(&conn, raw).await, Disposition::Continue);

        let expected = json!({"type":"success","data":{"type":"sub","contractID":"c1"}});
        assert_eq!(next_frame(&mut rx), expected);
        assert_eq!(next_frame(&mut rx), expected);
        assert_eq!(hub.subscribers_of(&ContractId::from("c1")).len(), 1);
    }

    #[tokio::test]
    async fn sub_notifies_existing_subscribers_but_not_self() {
        let hub = make_hub();
        let (first, mut first_rx) = attach(&hub, None);
        let (second, mut second_rx) = attach(&hub, None);
        let raw = r#"{"type":"sub","data":{"contractID":"c1"}}"#;

        let _ = hub.dispatch(&first, raw).await;
        let _ = next_frame(&mut first_rx); // ack

        let _ = hub.dispatch(&second, raw).await;
        let ack = next_frame(&mut second_rx);
        assert_eq!(ack["type"], "success");
        assert_no_frame(&mut second_rx);

        let note = next_frame(&mut first_rx);
        assert_eq!(
            note,
            json!({"type":"sub","data":{"contractID":"c1","socketID":second.id.as_str()}})
        );
    }

    #[tokio::test]
    async fn unsub_notifies_remaining_subscribers() {
        let hub = make_hub();
        let (first, mut first_rx) = attach(&hub, None);
        let (second, mut second_rx) = attach(&hub, None);
        let sub = r#"{"type":"sub","data":{"contractID":"c1"}}"#;
        let unsub = r#"{"type":"unsub","data":{"contractID":"c1"}}"#;

        let _ = hub.dispatch(&first, sub).await;
        let _ = hub.dispatch(&second, sub).await;
        let _ = next_frame(&mut first_rx); // ack
        let _ = next_frame(&mut first_rx); // second's sub note
        let _ = next_frame(&mut second_rx); // ack

        let _ = hub.dispatch(&second, unsub).await;
        let ack = next_frame(&mut second_rx);
        assert_eq!(ack["data"]["type"], "unsub");

        let note = next_frame(&mut first_rx);
        assert_eq!(
            note,
            json!({"type":"unsub","data":{"contractID":"c1","socketID":second.id.as_str()}})
        );
        assert_eq!(hub.subscribers_of(&ContractId::from("c1")), vec![first.id.clone()]);
    }

    #[tokio::test]
    async fn unsub_without_sub_still_acks() {
        let hub = make_hub();
        let (conn, mut rx) = attach(&hub, None);

        let _ = hub
            .dispatch(&conn, r#"{"type":"unsub","data":{"contractID":"nope"}}"#)
            .await;
        assert_eq!(
            next_frame(&mut rx),
            json!({"type":"success","data":{"type":"unsub","contractID":"nope"}})
        );
    }

    #[tokio::test]
    async fn remove_connection_broadcasts_departure() {
        let hub = make_hub();
        let (first, mut first_rx) = attach(&hub, None);
        let (second, mut second_rx) = attach(&hub, None);
        let sub = r#"{"type":"sub","data":{"contractID":"c1"}}"#;

        let _ = hub.dispatch(&first, sub).await;
        let _ = hub.dispatch(&second, sub).await;
        let _ = next_frame(&mut first_rx);
        let _ = next_frame(&mut first_rx);
        let _ = next_frame(&mut second_rx);

        hub.remove_connection(&first.id);

        let note = next_frame(&mut second_rx);
        assert_eq!(
            note,
            json!({"type":"unsub","data":{"contractID":"c1","socketID":first.id.as_str()}})
        );
        assert_eq!(hub.subscribers_of(&ContractId::from("c1")), vec![second.id.clone()]);
        assert_eq!(hub.connection_count(), 1);
    }

    #[tokio::test]
    async fn remove_connection_twice_is_noop() {
        let hub = make_hub();
        let (conn, _rx) = attach(&hub, None);
        hub.remove_connection(&conn.id);
        hub.remove_connection(&conn.id);
        assert_eq!(hub.connection_count(), 0);
    }

    #[tokio::test]
    async fn malformed_frame_terminates() {
        let hub = make_hub();
        let (conn, mut rx) = attach(&hub, None);
        assert_eq!(hub.dispatch(&conn, "not json").await, Disposition::Terminate);
        assert_no_frame(&mut rx);
    }

    #[tokio::test]
    async fn unknown_type_terminates() {
        let hub = make_hub();
        let (conn, _rx) = attach(&hub, None);
        let raw = r#"{"type":"bogus","data":1}"#;
        assert_eq!(hub.dispatch(&conn, raw).await, Disposition::Terminate);
    }

    #[tokio::test]
    async fn client_only_kind_terminates() {
        let hub = make_hub();
        let (conn, _rx) = attach(&hub, None);
        let raw = r#"{"type":"success","data":{"type":"sub","contractID":"c1"}}"#;
        assert_eq!(hub.dispatch(&conn, raw).await, Disposition::Terminate);
    }

    #[tokio::test]
    async fn pong_marks_activity() {
        let hub = make_hub();
        let (conn, _rx) = attach(&hub, None);
        conn.mark_pinged();
        assert!(conn.is_unresponsive());
        let raw = r#"{"type":"pong","data":123}"#;
        assert_eq!(hub.dispatch(&conn, raw).await, Disposition::Continue);
        assert!(!conn.is_unresponsive());
    }

    #[tokio::test]
    async fn pub_frame_is_accepted_and_ignored() {
        let hub = make_hub();
        let (conn, mut rx) = attach(&hub, None);
        let raw = r#"{"type":"pub","data":{"contractID":"c1","data":{"x":1}}}"#;
        assert_eq!(hub.dispatch(&conn, raw).await, Disposition::Continue);
        assert_no_frame(&mut rx);
    }

    #[tokio::test]
    async fn hook_replaces_default_handler() {
        let hook = Arc::new(RecordingHook {
            seen: parking_lot::Mutex::new(Vec::new()),
        });
        let mut hooks = HubHooks::new();
        let _ = hooks.insert(MessageKind::Sub, hook.clone() as Arc<dyn HubHook>);
        let hub = Hub::with_hooks(HubConfig::default(), hooks);
        let (conn, mut rx) = attach(&hub, None);

        let raw = r#"{"type":"sub","data":{"contractID":"c1"}}"#;
        assert_eq!(hub.dispatch(&conn, raw).await, Disposition::Continue);

        assert_eq!(hook.seen.lock().as_slice(), &[MessageKind::Sub]);
        // Default sub handling was replaced: no ack, no registry entry.
        assert_no_frame(&mut rx);
        assert!(hub.subscribers_of(&ContractId::from("c1")).is_empty());
    }

    #[tokio::test]
    async fn hook_can_enable_reserved_kind() {
        let hook = Arc::new(RecordingHook {
            seen: parking_lot::Mutex::new(Vec::new()),
        });
        let mut hooks = HubHooks::new();
        let _ = hooks.insert(MessageKind::Entry, hook.clone() as Arc<dyn HubHook>);
        let hub = Hub::with_hooks(HubConfig::default(), hooks);
        let (conn, _rx) = attach(&hub, None);

        // Without the hook this kind would terminate the connection.
        let raw = r#"{"type":"entry","data":{"seq":1}}"#;
        assert_eq!(hub.dispatch(&conn, raw).await, Disposition::Continue);
        assert_eq!(hook.seen.lock().as_slice(), &[MessageKind::Entry]);
    }

    #[tokio::test]
    async fn hook_failure_sends_error_then_close() {
        let mut hooks = HubHooks::new();
        let _ = hooks.insert(MessageKind::Pub, Arc::new(FailingHook) as Arc<dyn HubHook>);
        let hub = Hub::with_hooks(HubConfig::default(), hooks);
        let (conn, mut rx) = attach(&hub, None);

        let raw = r#"{"type":"pub","data":{"contractID":"c1","data":7}}"#;
        assert_eq!(hub.dispatch(&conn, raw).await, Disposition::Continue);

        let response = next_frame(&mut rx);
        assert_eq!(
            response,
            json!({"type":"error","data":{"type":"pub","data":{"contractID":"c1","data":7}}})
        );
        let (code, reason) = next_close(&mut rx);
        assert_eq!(code, HANDLER_FAILURE_CLOSE_CODE);
        assert_eq!(reason, "handler error");
    }

    #[tokio::test]
    async fn broadcast_skips_closed_and_excepted() {
        let hub = make_hub();
        let (_first, mut first_rx) = attach(&hub, None);
        let (second, mut second_rx) = attach(&hub, None);
        let (third, mut third_rx) = attach(&hub, None);
        second.mark_closed();

        let sent = hub
            .broadcast(&Message::Ping(1), BroadcastOpts {
                to: None,
                except: Some(&third.id),
            })
            .unwrap();

        assert_eq!(sent, 1);
        assert_eq!(next_frame(&mut first_rx), json!({"type":"ping","data":1}));
        assert_no_frame(&mut second_rx);
        assert_no_frame(&mut third_rx);
    }

    #[tokio::test]
    async fn broadcast_to_explicit_targets() {
        let hub = make_hub();
        let (first, mut first_rx) = attach(&hub, None);
        let (_second, mut second_rx) = attach(&hub, None);

        let targets = vec![first.id.clone()];
        let sent = hub
            .broadcast(&Message::Pong(9), BroadcastOpts {
                to: Some(&targets),
                except: None,
            })
            .unwrap();

        assert_eq!(sent, 1);
        assert_eq!(next_frame(&mut first_rx), json!({"type":"pong","data":9}));
        assert_no_frame(&mut second_rx);
    }

    #[tokio::test]
    async fn publish_reaches_subscribers_only() {
        let hub = make_hub();
        let (first, mut first_rx) = attach(&hub, None);
        let (second, mut second_rx) = attach(&hub, None);

        let _ = hub.dispatch(&first, r#"{"type":"sub","data":{"contractID":"c1"}}"#).await;
        let _ = hub.dispatch(&second, r#"{"type":"sub","data":{"contractID":"c2"}}"#).await;
        let _ = next_frame(&mut first_rx);
        let _ = next_frame(&mut second_rx);

        let sent = hub
            .publish(&ContractId::from("c1"), json!({"seq": 4, "body": "entry"}))
            .unwrap();

        assert_eq!(sent, 1);
        assert_eq!(
            next_frame(&mut first_rx),
            json!({"type":"entry","data":{"seq":4,"body":"entry"}})
        );
        assert_no_frame(&mut second_rx);
    }

    #[tokio::test]
    async fn publish_without_subscribers_sends_nothing() {
        let hub = make_hub();
        let sent = hub.publish(&ContractId::from("c9"), json!(1)).unwrap();
        assert_eq!(sent, 0);
    }

    #[tokio::test]
    async fn ping_sweep_pings_then_terminates_silent_peers() {
        let hub = make_hub();
        let (conn, mut rx) = attach(&hub, None);

        hub.ping_sweep();
        let ping = next_frame(&mut rx);
        assert_eq!(ping["type"], "ping");
        assert!(ping["data"].as_i64().unwrap() > 0);
        assert!(!conn.is_terminated());

        // No inbound traffic between sweeps: the second pass drops the peer.
        hub.ping_sweep();
        assert!(conn.is_terminated());
    }

    #[tokio::test]
    async fn ping_sweep_spares_replying_peers() {
        let hub = make_hub();
        let (conn, mut rx) = attach(&hub, None);

        hub.ping_sweep();
        let _ = next_frame(&mut rx);
        let _ = hub.dispatch(&conn, r#"{"type":"pong","data":1}"#).await;

        hub.ping_sweep();
        assert!(!conn.is_terminated());
        let _ = next_frame(&mut rx);
    }

    #[tokio::test]
    async fn uptime_and_counts_reflect_state() {
        let hub = make_hub();
        assert_eq!(hub.connection_count(), 0);
        assert_eq!(hub.contract_count(), 0);
        let (conn, _rx) = attach(&hub, None);
        let _ = hub.dispatch(&conn, r#"{"type":"sub","data":{"contractID":"c1"}}"#).await;
        assert_eq!(hub.connection_count(), 1);
        assert_eq!(hub.contract_count(), 1);
        assert_eq!(hub.contracts_of(&conn.id), vec![ContractId::from("c1")]);
        assert!(hub.uptime_secs() < 60);
    }
}
