//! The client actor and its public handle.
//!
//! All state lives in one task; the handle only posts commands. Every wait
//! (socket, handshake, deadlines, commands) is a branch of the same
//! `select!`, so there is nothing to lock.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use hawser_core::backoff;
use hawser_core::ids::ContractId;
use hawser_core::message::{self, Message, ProtoError, RequestKind, TIMEOUT_CLOSE_CODE};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};

use crate::errors::ClientError;
use crate::events::ClientEvent;
use crate::hooks::MessageHooks;
use crate::ledger::SubscriptionLedger;
use crate::options::ClientOptions;
use crate::timers::TimerSet;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type ConnectFuture = Pin<Box<dyn Future<Output = Result<WsStream, WsError>> + Send>>;

/// Where the one allowed socket currently stands.
enum Phase {
    Idle,
    Connecting(ConnectFuture),
    Open(WsStream),
}

impl Phase {
    fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    fn is_open(&self) -> bool {
        matches!(self, Self::Open(_))
    }
}

/// What the socket side of the `select!` produced.
enum SocketEvent {
    Connected(Result<WsStream, WsError>),
    Frame(Option<Result<WsMessage, WsError>>),
}

/// Resolve the next thing the socket does; pends forever while idle.
async fn next_socket_event(phase: &mut Phase) -> SocketEvent {
    match phase {
        Phase::Idle => std::future::pending().await,
        Phase::Connecting(handshake) => SocketEvent::Connected(handshake.as_mut().await),
        Phase::Open(ws) => SocketEvent::Frame(ws.next().await),
    }
}

enum Command {
    Connect {
        reply: oneshot::Sender<Result<(), ClientError>>,
    },
    Sub(ContractId),
    Unsub(ContractId),
    NetworkOnline,
    NetworkOffline,
    Snapshot {
        reply: oneshot::Sender<ClientSnapshot>,
    },
    Destroy,
}

/// Point-in-time view of the actor's state, for hosts and tests.
#[derive(Clone, Debug)]
pub struct ClientSnapshot {
    /// Whether a socket is currently open.
    pub connected: bool,
    /// Acknowledged subscriptions, sorted.
    pub subscriptions: Vec<ContractId>,
    /// Subscribe requests awaiting acknowledgment, sorted.
    pub pending_subscriptions: Vec<ContractId>,
    /// Unsubscribe requests awaiting acknowledgment, sorted.
    pub pending_unsubscriptions: Vec<ContractId>,
    /// Failed attempts since the last successful open (-1 right after one).
    pub failed_connection_attempts: i32,
    /// False once a fatal close or `destroy()` happened.
    pub should_reconnect: bool,
}

/// Handle to a client actor spawned with [`Client::spawn`].
///
/// Cheap to clone. Dropping the last handle destroys the client; the event
/// stream closing signals that the actor is gone for good.
#[derive(Clone)]
pub struct Client {
    commands: mpsc::UnboundedSender<Command>,
}

impl Client {
    /// Spawn a client actor for `url`; `http`/`https` URLs are rewritten to
    /// `ws`/`wss`. Connects immediately unless `options.manual` is set.
    ///
    /// Returns the handle and the ordered event stream.
    #[must_use]
    pub fn spawn(
        url: impl Into<String>,
        options: ClientOptions,
        hooks: MessageHooks,
    ) -> (Self, mpsc::UnboundedReceiver<ClientEvent>) {
        let url = rewrite_scheme(&url.into());
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let auto_connect = !options.manual;
        let actor = Actor::new(url, options, hooks, command_rx, event_tx);
        let _ = tokio::spawn(actor.run(auto_connect));
        (Self { commands: command_tx }, event_rx)
    }

    /// Open a connection. Errors when a socket already exists, a
    /// reconnection delay is pending, or reconnection was disabled.
    pub async fn connect(&self) -> Result<(), ClientError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Connect { reply })
            .map_err(|_| ClientError::Destroyed)?;
        rx.await.map_err(|_| ClientError::Destroyed)?
    }

    /// Ask the hub for updates to a contract log. Queued and replayed until
    /// acknowledged; a pending opposite request is cancelled.
    pub fn sub(&self, contract_id: ContractId) -> Result<(), ClientError> {
        self.commands
            .send(Command::Sub(contract_id))
            .map_err(|_| ClientError::Destroyed)
    }

    /// Stop updates for a contract log. Same queueing rules as [`sub`](Self::sub).
    pub fn unsub(&self, contract_id: ContractId) -> Result<(), ClientError> {
        self.commands
            .send(Command::Unsub(contract_id))
            .map_err(|_| ClientError::Destroyed)
    }

    /// Tell the client the network came back.
    pub fn network_online(&self) -> Result<(), ClientError> {
        self.commands
            .send(Command::NetworkOnline)
            .map_err(|_| ClientError::Destroyed)
    }

    /// Tell the client the network went away.
    pub fn network_offline(&self) -> Result<(), ClientError> {
        self.commands
            .send(Command::NetworkOffline)
            .map_err(|_| ClientError::Destroyed)
    }

    /// Current actor state.
    pub async fn snapshot(&self) -> Result<ClientSnapshot, ClientError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Snapshot { reply })
            .map_err(|_| ClientError::Destroyed)?;
        rx.await.map_err(|_| ClientError::Destroyed)
    }

    /// Tear the client down for good. Idempotent.
    pub fn destroy(&self) {
        let _ = self.commands.send(Command::Destroy);
    }
}

struct Actor {
    url: String,
    options: ClientOptions,
    hooks: MessageHooks,
    commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<ClientEvent>,
    phase: Phase,
    ledger: SubscriptionLedger,
    timers: TimerSet,
    failed_attempts: i32,
    is_new: bool,
    should_reconnect: bool,
}

impl Actor {
    fn new(
        url: String,
        options: ClientOptions,
        hooks: MessageHooks,
        commands: mpsc::UnboundedReceiver<Command>,
        events: mpsc::UnboundedSender<ClientEvent>,
    ) -> Self {
        Self {
            url,
            options,
            hooks,
            commands,
            events,
            phase: Phase::Idle,
            ledger: SubscriptionLedger::new(),
            timers: TimerSet::default(),
            failed_attempts: 0,
            is_new: true,
            should_reconnect: true,
        }
    }

    async fn run(mut self, auto_connect: bool) {
        if auto_connect {
            if let Err(e) = self.start_connect() {
                debug!(error = %e, "initial connect refused");
            }
        }
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => {
                        if !self.handle_command(command).await {
                            break;
                        }
                    }
                    None => {
                        self.destroy().await;
                        break;
                    }
                },
                event = next_socket_event(&mut self.phase) => {
                    if !self.handle_socket_event(event).await {
                        break;
                    }
                }
                () = self.timers.connect.fired() => {
                    if !self.handle_connect_timeout().await {
                        break;
                    }
                }
                () = self.timers.ping.fired() => {
                    if !self.handle_ping_timeout().await {
                        break;
                    }
                }
                () = self.timers.reconnect.fired() => {
                    self.timers.reconnect.cancel();
                    self.emit(ClientEvent::ReconnectionAttempt);
                    if let Err(e) = self.start_connect() {
                        warn!(error = %e, "scheduled connect refused");
                    }
                }
            }
        }
    }

    /// Returns whether the actor should keep running.
    async fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Connect { reply } => {
                let result = self.start_connect();
                let _ = reply.send(result);
                true
            }
            Command::Sub(contract_id) => {
                if self.ledger.request_sub(&contract_id) {
                    self.send_if_open(&Message::sub_request(contract_id)).await;
                }
                true
            }
            Command::Unsub(contract_id) => {
                if self.ledger.request_unsub(&contract_id) {
                    self.send_if_open(&Message::unsub_request(contract_id)).await;
                }
                true
            }
            Command::NetworkOnline => {
                self.network_online();
                true
            }
            Command::NetworkOffline => self.network_offline().await,
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
                true
            }
            Command::Destroy => {
                self.destroy().await;
                false
            }
        }
    }

    fn start_connect(&mut self) -> Result<(), ClientError> {
        if !self.phase.is_idle() {
            return Err(ClientError::SocketExists);
        }
        if self.timers.reconnect.is_armed() {
            return Err(ClientError::ReconnectPending);
        }
        if !self.should_reconnect {
            return Err(ClientError::ReconnectDisabled);
        }
        debug!(url = %self.url, "connecting");
        let url = self.url.clone();
        self.phase = Phase::Connecting(Box::pin(async move {
            tokio_tungstenite::connect_async(url.as_str())
                .await
                .map(|(ws, _response)| ws)
        }));
        if self.options.timeout_ms > 0 {
            self.timers
                .connect
                .arm(Duration::from_millis(self.options.timeout_ms));
        }
        Ok(())
    }

    async fn on_open(&mut self) {
        debug!("socket open");
        let resumed = !self.is_new;
        if resumed {
            self.emit(ClientEvent::ReconnectionSucceeded);
        }
        self.timers.clear_all();
        // -1 so the counter reads 0 after the next close increments it.
        self.failed_attempts = -1;
        self.is_new = false;
        self.arm_ping_timer();
        // Replay whatever the hub has not acknowledged yet.
        for request in self.ledger.resend_queue() {
            self.send_if_open(&request).await;
        }
        self.emit(ClientEvent::Connected { resumed });
    }

    /// Returns whether the actor should keep running.
    async fn handle_socket_event(&mut self, event: SocketEvent) -> bool {
        match event {
            SocketEvent::Connected(Ok(ws)) => {
                self.phase = Phase::Open(ws);
                self.on_open().await;
                true
            }
            SocketEvent::Connected(Err(e)) => {
                self.phase = Phase::Idle;
                self.emit(ClientEvent::Error {
                    message: format!("connect failed: {e}"),
                });
                self.handle_close(1006, &e.to_string()).await
            }
            SocketEvent::Frame(Some(Ok(WsMessage::Text(text)))) => {
                self.handle_raw(text.as_str()).await
            }
            SocketEvent::Frame(Some(Ok(WsMessage::Binary(_)))) => {
                self.emit(ClientEvent::Error {
                    message: "critical error: binary frame received".to_string(),
                });
                self.destroy().await;
                false
            }
            SocketEvent::Frame(Some(Ok(WsMessage::Close(frame)))) => {
                let (code, reason) = match frame {
                    Some(frame) => (u16::from(frame.code), frame.reason.to_string()),
                    None => (1006, String::new()),
                };
                self.phase = Phase::Idle;
                self.handle_close(code, &reason).await
            }
            // Transport-level ping/pong and raw frames need no handling.
            SocketEvent::Frame(Some(Ok(_))) => true,
            SocketEvent::Frame(Some(Err(e))) => {
                self.phase = Phase::Idle;
                self.emit(ClientEvent::Error {
                    message: e.to_string(),
                });
                self.handle_close(1006, &e.to_string()).await
            }
            SocketEvent::Frame(None) => {
                self.phase = Phase::Idle;
                self.handle_close(1006, "").await
            }
        }
    }

    /// Dispatch one inbound text frame. Returns whether the actor should
    /// keep running.
    async fn handle_raw(&mut self, raw: &str) -> bool {
        let parsed = match message::parse(raw) {
            Ok(message) => message,
            Err(e @ ProtoError::UnknownType(_)) => {
                self.emit(ClientEvent::Error {
                    message: e.to_string(),
                });
                return true;
            }
            Err(e) => {
                self.emit(ClientEvent::Error {
                    message: format!("critical error: {e}"),
                });
                self.destroy().await;
                return false;
            }
        };
        let kind = parsed.kind();
        if let Some(hook) = self.hooks.get(&kind) {
            if let Err(e) = hook.handle(&parsed).await {
                self.emit(ClientEvent::Error {
                    message: format!("{kind} handler failed: {e}"),
                });
            }
            return true;
        }
        match parsed {
            Message::Ping(data) => {
                trace!(data, "ping");
                self.send_if_open(&Message::Pong(data)).await;
                self.arm_ping_timer();
                true
            }
            Message::Success(ack) => {
                match ack.request {
                    RequestKind::Sub => {
                        debug!(contract_id = %ack.contract_id, "subscribed");
                        self.ledger.confirm_sub(&ack.contract_id);
                    }
                    RequestKind::Unsub => {
                        debug!(contract_id = %ack.contract_id, "unsubscribed");
                        self.ledger.confirm_unsub(&ack.contract_id);
                    }
                }
                true
            }
            Message::Error(inner) => {
                debug!(kind = %inner.kind(), "request rejected by the hub");
                true
            }
            Message::Entry(data) => {
                self.emit(ClientEvent::Entry { data });
                true
            }
            Message::Pub(_) | Message::Sub(_) | Message::Unsub(_) => {
                trace!(%kind, "ignoring notification");
                true
            }
            Message::Pong(_) => {
                self.emit(ClientEvent::Error {
                    message: "unhandled message type: pong".to_string(),
                });
                true
            }
        }
    }

    /// Close bookkeeping and reconnection policy. Returns whether the actor
    /// should keep running.
    async fn handle_close(&mut self, code: u16, reason: &str) -> bool {
        debug!(code, reason, "socket closed");
        self.failed_attempts += 1;
        self.phase = Phase::Idle;
        self.timers.clear_all();
        self.emit(ClientEvent::Disconnected {
            code,
            reason: reason.to_string(),
        });
        if self.options.is_fatal_close_code(code) {
            debug!(code, "close code rules out reconnection");
            self.should_reconnect = false;
        }
        let wants_retry = if code == TIMEOUT_CLOSE_CODE {
            self.options.reconnect_on_timeout
        } else {
            self.options.reconnect_on_disconnection
        };
        if self.should_reconnect && wants_retry {
            if self.failed_attempts <= max_retries(&self.options) {
                self.schedule_connection_attempt();
            } else {
                self.emit(ClientEvent::ReconnectionFailed);
                self.destroy().await;
                return false;
            }
        }
        true
    }

    fn schedule_connection_attempt(&mut self) {
        if !self.should_reconnect {
            warn!("reconnection is disabled, not scheduling");
            return;
        }
        let delay_ms = backoff::next_reconnection_delay(
            u32::try_from(self.failed_attempts.max(0)).unwrap_or(0),
            self.options.min_reconnection_delay_ms,
            self.options.max_reconnection_delay_ms,
            self.options.reconnection_delay_grow_factor,
        );
        let attempt = u32::try_from(self.failed_attempts + 1).unwrap_or(u32::MAX);
        self.timers.reconnect.arm(Duration::from_millis(delay_ms));
        self.emit(ClientEvent::ReconnectionScheduled { delay_ms, attempt });
    }

    /// The handshake deadline fired: abandon the attempt, close with the
    /// reserved timeout code.
    async fn handle_connect_timeout(&mut self) -> bool {
        self.timers.connect.cancel();
        warn!("connection attempt timed out");
        self.phase = Phase::Idle;
        self.handle_close(TIMEOUT_CLOSE_CODE, "timeout").await
    }

    /// The hub went quiet past the ping deadline: send a close frame and
    /// discard the socket without waiting for a reply. A peer that is
    /// TCP-alive but silent would never send one, and this deadline exists
    /// precisely for that peer.
    async fn handle_ping_timeout(&mut self) -> bool {
        self.timers.ping.cancel();
        warn!("no ping from the hub, closing socket");
        if let Phase::Open(ws) = &mut self.phase {
            if let Err(e) = ws.close(None).await {
                debug!(error = %e, "close failed");
            }
            self.phase = Phase::Idle;
            return self.handle_close(1006, "ping timeout").await;
        }
        true
    }

    fn network_online(&mut self) {
        debug!("network online");
        if self.options.reconnect_on_online && self.should_reconnect && self.phase.is_idle() {
            self.failed_attempts = 0;
            // Re-arming replaces any delay already pending.
            self.schedule_connection_attempt();
        }
    }

    /// Returns whether the actor should keep running.
    async fn network_offline(&mut self) -> bool {
        debug!("network offline");
        self.timers.ping.cancel();
        self.failed_attempts = 0;
        match &mut self.phase {
            // Do not wait for a close reply; the network is gone.
            Phase::Open(ws) => {
                if let Err(e) = ws.close(None).await {
                    debug!(error = %e, "close failed");
                }
                self.phase = Phase::Idle;
                self.handle_close(1006, "offline").await
            }
            Phase::Connecting(_) => {
                self.phase = Phase::Idle;
                self.handle_close(1006, "offline").await
            }
            Phase::Idle => true,
        }
    }

    async fn destroy(&mut self) {
        debug!("destroying client");
        self.timers.clear_all();
        self.ledger.clear();
        self.should_reconnect = false;
        if let Phase::Open(ws) = &mut self.phase {
            let _ = ws.close(None).await;
        }
        self.phase = Phase::Idle;
    }

    async fn send_if_open(&mut self, message: &Message) {
        let Phase::Open(ws) = &mut self.phase else {
            return;
        };
        match message.encode() {
            Ok(frame) => {
                // A failed send surfaces on the next read; nothing to do here.
                if let Err(e) = ws.send(WsMessage::text(frame)).await {
                    debug!(error = %e, "send failed");
                }
            }
            Err(e) => warn!(error = %e, "failed to encode frame"),
        }
    }

    fn arm_ping_timer(&mut self) {
        if self.options.ping_timeout_ms > 0 {
            self.timers
                .ping
                .arm(Duration::from_millis(self.options.ping_timeout_ms));
        }
    }

    fn snapshot(&self) -> ClientSnapshot {
        ClientSnapshot {
            connected: self.phase.is_open(),
            subscriptions: self.ledger.confirmed(),
            pending_subscriptions: self.ledger.pending_subs(),
            pending_unsubscriptions: self.ledger.pending_unsubs(),
            failed_connection_attempts: self.failed_attempts,
            should_reconnect: self.should_reconnect,
        }
    }

    fn emit(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }
}

fn max_retries(options: &ClientOptions) -> i32 {
    i32::try_from(options.max_retries).unwrap_or(i32::MAX)
}

/// Rewrite an `http`/`https` URL to its WebSocket scheme. The trailing `s`
/// survives, so `https` becomes `wss`.
fn rewrite_scheme(url: &str) -> String {
    match url.strip_prefix("http") {
        Some(rest) => format!("ws{rest}"),
        None => url.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
