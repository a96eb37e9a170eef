//! Per-socket connection state and outbound queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use hawser_core::ids::SocketId;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// An item queued for the connection's writer task.
#[derive(Debug)]
pub(crate) enum Outbound {
    /// A serialized frame to deliver.
    Frame(Arc<String>),
    /// Send a close frame with this code and reason, then stop writing.
    Close(u16, String),
}

/// A connected WebSocket peer as the hub sees it.
pub struct Connection {
    /// Identifier assigned at upgrade time.
    pub id: SocketId,
    /// Queue drained by the connection's writer task.
    tx: mpsc::Sender<Outbound>,
    /// When the connection was established.
    pub connected_at: Instant,
    /// False once teardown has begun; fan-out skips non-open connections.
    open: AtomicBool,
    /// Whether any message arrived since the last liveness sweep.
    active_since_ping: AtomicBool,
    /// Whether a sweep ping went out that the peer has not yet answered.
    pinged: AtomicBool,
    /// Cancelling drops the connection without a close handshake.
    cancel: CancellationToken,
    /// Count of frames dropped because the queue was full.
    pub dropped_frames: AtomicU64,
}

impl Connection {
    /// Create a connection in the open state.
    pub(crate) fn new(id: SocketId, tx: mpsc::Sender<Outbound>, cancel: CancellationToken) -> Self {
        Self {
            id,
            tx,
            connected_at: Instant::now(),
            open: AtomicBool::new(true),
            active_since_ping: AtomicBool::new(true),
            pinged: AtomicBool::new(false),
            cancel,
            dropped_frames: AtomicU64::new(0),
        }
    }

    /// Queue a serialized frame for delivery.
    ///
    /// Returns `false` if the queue is full or closed, and counts the drop.
    pub fn send(&self, frame: Arc<String>) -> bool {
        if self.tx.try_send(Outbound::Frame(frame)).is_ok() {
            true
        } else {
            let _ = self.dropped_frames.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Queue a close frame; the writer stops after sending it.
    pub fn close(&self, code: u16, reason: &str) -> bool {
        self.tx
            .try_send(Outbound::Close(code, reason.to_owned()))
            .is_ok()
    }

    /// Drop the connection without a close handshake.
    pub fn terminate(&self) {
        self.cancel.cancel();
    }

    /// Whether [`terminate`](Self::terminate) has been called.
    pub fn is_terminated(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Token tying the reader and writer tasks together.
    pub(crate) fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Whether the connection is still open for delivery.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Relaxed)
    }

    /// Mark teardown as begun; subsequent fan-out skips this connection.
    pub(crate) fn mark_closed(&self) {
        self.open.store(false, Ordering::Relaxed);
    }

    /// Record inbound activity since the last sweep.
    pub(crate) fn mark_active(&self) {
        self.active_since_ping.store(true, Ordering::Relaxed);
    }

    /// Record that a sweep ping went out and a fresh activity window began.
    pub(crate) fn mark_pinged(&self) {
        self.pinged.store(true, Ordering::Relaxed);
        self.active_since_ping.store(false, Ordering::Relaxed);
    }

    /// A pinged connection with no activity since is considered dead.
    pub(crate) fn is_unresponsive(&self) -> bool {
        self.pinged.load(Ordering::Relaxed) && !self.active_since_ping.load(Ordering::Relaxed)
    }

    /// Total frames dropped for this connection.
    pub fn drop_count(&self) -> u64 {
        self.dropped_frames.load(Ordering::Relaxed)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_connection() -> (Connection, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(4);
        let conn = Connection::new(
            SocketId::from_parts(1, None),
            tx,
            CancellationToken::new(),
        );
        (conn, rx)
    }

    #[test]
    fn starts_open_active_and_unpinged() {
        let (conn, _rx) = make_connection();
        assert!(conn.is_open());
        assert!(!conn.is_unresponsive());
        assert!(!conn.is_terminated());
    }

    #[tokio::test]
    async fn send_queues_frame() {
        let (conn, mut rx) = make_connection();
        assert!(conn.send(Arc::new("hello".to_owned())));
        match rx.recv().await.unwrap() {
            Outbound::Frame(frame) => assert_eq!(&*frame, "hello"),
            other => panic!("expected frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_to_full_queue_counts_drop() {
        let (tx, _rx) = mpsc::channel(1);
        let conn = Connection::new(SocketId::from_parts(2, None), tx, CancellationToken::new());
        assert!(conn.send(Arc::new("first".to_owned())));
        assert!(!conn.send(Arc::new("second".to_owned())));
        assert_eq!(conn.drop_count(), 1);
    }

    #[tokio::test]
    async fn send_to_closed_queue_returns_false() {
        let (tx, rx) = mpsc::channel(4);
        let conn = Connection::new(SocketId::from_parts(3, None), tx, CancellationToken::new());
        drop(rx);
        assert!(!conn.send(Arc::new("late".to_owned())));
    }

    #[tokio::test]
    async fn close_queues_close_item() {
        let (conn, mut rx) = make_connection();
        assert!(conn.close(1011, "handler error"));
        match rx.recv().await.unwrap() {
            Outbound::Close(code, reason) => {
                assert_eq!(code, 1011);
                assert_eq!(reason, "handler error");
            }
            other => panic!("expected close, got {other:?}"),
        }
    }

    #[test]
    fn terminate_cancels_token() {
        let (conn, _rx) = make_connection();
        let token = conn.cancel_token();
        conn.terminate();
        assert!(token.is_cancelled());
        assert!(conn.is_terminated());
    }

    #[test]
    fn sweep_flag_cycle() {
        let (conn, _rx) = make_connection();
        // Fresh connection: counts as active, never pinged.
        assert!(!conn.is_unresponsive());
        conn.mark_pinged();
        assert!(conn.is_unresponsive());
        conn.mark_active();
        assert!(!conn.is_unresponsive());
        conn.mark_pinged();
        assert!(conn.is_unresponsive());
    }

    #[test]
    fn mark_closed_flips_open() {
        let (conn, _rx) = make_connection();
        assert!(conn.is_open());
        conn.mark_closed();
        assert!(!conn.is_open());
    }
}
