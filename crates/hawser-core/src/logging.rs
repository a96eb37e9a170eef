//! Tracing subscriber setup shared by the hub daemon, the client, and tests.

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// Respects `RUST_LOG` when set, otherwise falls back to `level`. Output is
/// compact, targeted, and goes to stderr so piped stdout stays clean. Safe to
/// call more than once; later calls are no-ops.
pub fn init_subscriber(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
