//! Branded ID newtypes for the pubsub protocol.
//!
//! Contract log identifiers and socket identifiers are distinct newtype
//! wrappers around `String` so one can never be passed where the other is
//! expected. Contract IDs are opaque and chosen by the outer application.
//! Socket IDs are minted by the hub from a monotonic counter, optionally
//! suffixed with a caller-supplied debug label (`"3-alice"`).

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! branded_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create from an existing string value.
            #[must_use]
            pub fn from_string(s: String) -> Self {
                Self(s)
            }

            /// Return the inner string as a slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

branded_id! {
    /// Identifier of an append-only contract log.
    ContractId
}

branded_id! {
    /// Identifier the hub assigns to a connected socket.
    SocketId
}

impl SocketId {
    /// Build a socket ID from a counter value and an optional debug label.
    ///
    /// The label comes from the `?debugID=` query parameter of the upgrade
    /// request and makes log lines attributable during development.
    #[must_use]
    pub fn from_parts(seq: u64, debug_id: Option<&str>) -> Self {
        match debug_id {
            Some(label) => Self(format!("{seq}-{label}")),
            None => Self(seq.to_string()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
