//! WebSocket session lifecycle: one task per connected socket, from upgrade
//! through disconnect cleanup.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::ws::{CloseFrame, Message as WsMessage, WebSocket};
use futures::{SinkExt, StreamExt};
use metrics::histogram;
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

use crate::connection::{Connection, Outbound};
use crate::hub::{Disposition, Hub};

/// Run one socket to completion.
///
/// 1. Mints a socket ID and registers the connection with the hub
/// 2. Spawns a writer task that drains the outbound queue
/// 3. Dispatches inbound frames until the peer goes away or is terminated
/// 4. Unlinks the socket and notifies its contract peers on the way out
#[instrument(skip_all, fields(socket_id))]
pub(crate) async fn run_socket(hub: Arc<Hub>, socket: WebSocket, debug_id: Option<String>) {
    let socket_id = hub.mint_socket_id(debug_id.as_deref());
    let _ = tracing::Span::current().record("socket_id", socket_id.as_str());

    let (tx, mut rx) = mpsc::channel::<Outbound>(hub.config().send_queue);
    let cancel = hub.shutdown_coordinator().child_token();
    let connection = Arc::new(Connection::new(socket_id.clone(), tx, cancel.clone()));
    hub.insert_connection(connection.clone());
    let started = Instant::now();

    let (mut ws_tx, mut ws_rx) = socket.split();

    // Writer: drains the outbound queue onto the socket. A queued close frame
    // ends the session; so does cancellation or a dead transport.
    let writer_cancel = cancel.clone();
    let writer = tokio::spawn(async move {
        loop {
            tokio::select! {
                () = writer_cancel.cancelled() => break,
                item = rx.recv() => match item {
                    Some(Outbound::Frame(frame)) => {
                        if ws_tx.send(WsMessage::Text(frame.as_str().into())).await.is_err() {
                            break;
                        }
                    }
                    Some(Outbound::Close(code, reason)) => {
                        let _ = ws_tx
                            .send(WsMessage::Close(Some(CloseFrame {
                                code,
                                reason: reason.into(),
                            })))
                            .await;
                        break;
                    }
                    None => break,
                },
            }
        }
        writer_cancel.cancel();
    });

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            frame = ws_rx.next() => {
                let Some(frame) = frame else { break };
                match frame {
                    Ok(WsMessage::Text(text)) => {
                        if !dispatch_text(&hub, &connection, text.as_str()).await {
                            break;
                        }
                    }
                    Ok(WsMessage::Binary(data)) => match std::str::from_utf8(&data) {
                        Ok(text) => {
                            if !dispatch_text(&hub, &connection, text).await {
                                break;
                            }
                        }
                        Err(_) => {
                            warn!(len = data.len(), "non-UTF8 binary frame, dropping connection");
                            break;
                        }
                    },
                    Ok(WsMessage::Close(_)) => {
                        debug!("peer sent close frame");
                        break;
                    }
                    // Transport-level frames do not count as application
                    // activity for the liveness sweep.
                    Ok(WsMessage::Ping(_) | WsMessage::Pong(_)) => {}
                    Err(e) => {
                        debug!(error = %e, "socket error");
                        break;
                    }
                }
            }
        }
    }

    cancel.cancel();
    hub.remove_connection(&socket_id);
    let _ = writer.await;
    histogram!("hub_connection_duration_seconds").record(started.elapsed().as_secs_f64());
}

/// Dispatch one text frame; returns whether the session should keep reading.
async fn dispatch_text(hub: &Arc<Hub>, connection: &Arc<Connection>, text: &str) -> bool {
    match hub.dispatch(connection, text).await {
        Disposition::Continue => true,
        Disposition::Terminate => {
            connection.terminate();
            false
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
