//! Client-facing error types.

use thiserror::Error;

/// Why a client call was refused.
///
/// These are caller mistakes (connecting twice, using a destroyed handle),
/// not transport conditions; transport trouble surfaces as
/// [`ClientEvent`](crate::ClientEvent)s instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClientError {
    /// A socket already exists or a connect attempt is in flight.
    #[error("a socket already exists")]
    SocketExists,

    /// A reconnection delay is pending; the client will connect by itself.
    #[error("a reconnection attempt is already scheduled")]
    ReconnectPending,

    /// Reconnection was permanently disabled by a fatal close or `destroy()`.
    #[error("reconnection is disabled")]
    ReconnectDisabled,

    /// The actor is gone; this handle will never work again.
    #[error("client has been destroyed")]
    Destroyed,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(ClientError::SocketExists.to_string(), "a socket already exists");
        assert_eq!(
            ClientError::ReconnectPending.to_string(),
            "a reconnection attempt is already scheduled"
        );
        assert_eq!(ClientError::ReconnectDisabled.to_string(), "reconnection is disabled");
        assert_eq!(ClientError::Destroyed.to_string(), "client has been destroyed");
    }
}
