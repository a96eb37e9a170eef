//! Randomized exponential backoff for reconnection scheduling.
//!
//! The delay before attempt `n` is drawn uniformly from
//! `[min * g^n, min * g^(n+1))` and capped at the configured maximum, so a
//! fleet of clients that lost the same hub does not reconnect in lockstep.

/// Default lower bound for the first reconnection delay, in milliseconds.
pub const DEFAULT_MIN_RECONNECTION_DELAY_MS: u64 = 500;

/// Default cap on reconnection delays, in milliseconds.
pub const DEFAULT_MAX_RECONNECTION_DELAY_MS: u64 = 60_000;

/// Default growth factor applied between consecutive attempts.
pub const DEFAULT_RECONNECTION_DELAY_GROW_FACTOR: f64 = 2.0;

/// Default number of reconnection attempts before giving up.
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Compute the delay in milliseconds before reconnection attempt number
/// `failed_attempts`, using the provided `random` value in `[0, 1)`.
///
/// Exposed with injected randomness so callers and tests can pin the jitter.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]
pub fn next_reconnection_delay_with_random(
    failed_attempts: u32,
    min_delay_ms: u64,
    max_delay_ms: u64,
    grow_factor: f64,
    random: f64,
) -> u64 {
    let floor = (min_delay_ms as f64) * grow_factor.powi(failed_attempts as i32);
    let ceiling = floor * grow_factor;
    let jittered = (floor + random * (ceiling - floor)).round();
    jittered.min(max_delay_ms as f64) as u64
}

/// Compute the next reconnection delay with thread-local randomness.
#[must_use]
pub fn next_reconnection_delay(
    failed_attempts: u32,
    min_delay_ms: u64,
    max_delay_ms: u64,
    grow_factor: f64,
) -> u64 {
    next_reconnection_delay_with_random(
        failed_attempts,
        min_delay_ms,
        max_delay_ms,
        grow_factor,
        rand::random::<f64>(),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
