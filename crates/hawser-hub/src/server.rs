//! HTTP surface: the `/ws` upgrade endpoint and `/health`.

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::health::HealthResponse;
use crate::hub::Hub;
use crate::liveness::spawn_ping_sweep;
use crate::session::run_socket;

#[derive(Clone)]
pub(crate) struct AppState {
    hub: Arc<Hub>,
}

impl Hub {
    /// Build the hub's router. Exposed separately from [`listen`](Self::listen)
    /// so the routes can mount under a larger application.
    #[must_use]
    pub fn router(self: &Arc<Self>) -> Router {
        let state = AppState { hub: self.clone() };
        Router::new()
            .route("/ws", get(ws_handler))
            .route("/health", get(health_handler))
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Bind the configured address and serve until shutdown.
    ///
    /// Also starts the ping sweep unless `ping_interval_ms` is zero. Returns
    /// the bound address (useful with port 0) and the server task handle.
    pub async fn listen(self: &Arc<Self>) -> io::Result<(SocketAddr, JoinHandle<()>)> {
        let listener = tokio::net::TcpListener::bind(format!(
            "{}:{}",
            self.config().host,
            self.config().port
        ))
        .await?;
        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, "hub listening");

        if self.config().ping_interval_ms > 0 {
            let interval = Duration::from_millis(self.config().ping_interval_ms);
            let _ = spawn_ping_sweep(
                self.clone(),
                interval,
                self.shutdown_coordinator().child_token(),
            );
        }

        let router = self.router();
        let token = self.shutdown_coordinator().token();
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(token.cancelled_owned())
                .await
            {
                error!(error = %e, "server error");
            }
        });
        Ok((local_addr, handle))
    }
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let debug_id = params.get("debugID").cloned();
    let hub = state.hub.clone();
    ws.max_message_size(hub.config().max_payload)
        .on_upgrade(move |socket| run_socket(hub, socket, debug_id))
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::from_hub(&state.hub))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
