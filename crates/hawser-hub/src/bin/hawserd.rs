//! `hawserd`: run the hub as a standalone daemon.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use hawser_core::logging::init_subscriber;
use hawser_hub::{Hub, HubConfig};
use tracing::info;

/// Realtime pubsub hub for contract logs.
#[derive(Debug, Parser)]
#[command(name = "hawserd", version)]
struct Args {
    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind (0 picks a free port).
    #[arg(long, default_value_t = 4600)]
    port: u16,

    /// Milliseconds between liveness sweeps (0 disables the sweep).
    #[arg(long, default_value_t = 30_000)]
    ping_interval_ms: u64,

    /// Largest accepted frame in bytes.
    #[arg(long, default_value_t = 6 * 1024 * 1024)]
    max_payload: usize,

    /// Log level used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_subscriber(&args.log_level);

    let config = HubConfig {
        host: args.host,
        port: args.port,
        max_payload: args.max_payload,
        ping_interval_ms: args.ping_interval_ms,
        ..HubConfig::default()
    };
    let hub = Arc::new(Hub::new(config));
    let (addr, server) = hub.listen().await?;
    info!(%addr, "hawserd running");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    hub.shutdown_coordinator()
        .drain(vec![server], Some(Duration::from_secs(10)))
        .await;
    Ok(())
}
