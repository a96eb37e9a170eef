//! Wire protocol for the pubsub layer.
//!
//! Every frame is a JSON envelope `{"type": <tag>, "data": <payload>}` where
//! `type` is one of a closed set of lowercase tags. [`parse`] distinguishes
//! malformed frames ([`ProtoError::Parse`]) from well-formed frames carrying
//! a tag outside the closed set ([`ProtoError::UnknownType`]) so dispatchers
//! can apply a different policy to each.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::ids::{ContractId, SocketId};

/// Close code a client sends when it gives up on a connection attempt.
pub const TIMEOUT_CLOSE_CODE: u16 = 4000;

/// Close code the hub sends after a message handler failure.
pub const HANDLER_FAILURE_CLOSE_CODE: u16 = 1011;

/// The complete set of wire tags recognized by [`parse`].
const KNOWN_TAGS: [&str; 8] = [
    "ping", "pong", "sub", "unsub", "pub", "entry", "success", "error",
];

/// Errors arising from encoding or decoding wire messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    /// The frame is not a valid message envelope.
    #[error("malformed message: {0}")]
    Parse(String),
    /// The envelope is well-formed but its type tag is not recognized.
    #[error("unhandled message type: {0}")]
    UnknownType(String),
    /// A message could not be serialized.
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Payload of `sub` and `unsub` frames.
///
/// Requests carry only the contract ID. Notifications broadcast by the hub
/// add the socket ID of the peer whose membership changed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionInfo {
    /// The contract log the frame refers to.
    #[serde(rename = "contractID")]
    pub contract_id: ContractId,
    /// Set on hub notifications; absent on client requests.
    #[serde(
        rename = "socketID",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub socket_id: Option<SocketId>,
}

/// Payload of `pub` frames. Reserved: the hub accepts these and does nothing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PubFrame {
    /// The contract log the publication targets.
    #[serde(rename = "contractID")]
    pub contract_id: ContractId,
    /// Opaque payload.
    #[serde(default)]
    pub data: Value,
}

/// The two acknowledgeable request kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    /// A subscription request.
    Sub,
    /// An unsubscription request.
    Unsub,
}

impl RequestKind {
    /// The lowercase wire tag for this request kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sub => "sub",
            Self::Unsub => "unsub",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of `success` acknowledgments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Which request kind is being acknowledged.
    #[serde(rename = "type")]
    pub request: RequestKind,
    /// The contract log the acknowledged request referred to.
    #[serde(rename = "contractID")]
    pub contract_id: ContractId,
}

/// A single wire frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Message {
    /// Liveness probe carrying the sender's timestamp in milliseconds.
    Ping(i64),
    /// Probe reply echoing the probe's timestamp.
    Pong(i64),
    /// Subscription request, or membership notification from the hub.
    Sub(SubscriptionInfo),
    /// Unsubscription request, or membership notification from the hub.
    Unsub(SubscriptionInfo),
    /// Reserved publish frame.
    Pub(PubFrame),
    /// A new log entry pushed to current subscribers.
    Entry(Value),
    /// Positive acknowledgment of a `sub` or `unsub` request.
    Success(Ack),
    /// Failure report echoing the message that triggered it.
    Error(Box<Message>),
}

impl Message {
    /// A `sub` request for the given contract.
    #[must_use]
    pub fn sub_request(contract_id: ContractId) -> Self {
        Self::Sub(SubscriptionInfo {
            contract_id,
            socket_id: None,
        })
    }

    /// An `unsub` request for the given contract.
    #[must_use]
    pub fn unsub_request(contract_id: ContractId) -> Self {
        Self::Unsub(SubscriptionInfo {
            contract_id,
            socket_id: None,
        })
    }

    /// A `sub` notification announcing that `socket_id` joined `contract_id`.
    #[must_use]
    pub fn sub_notification(contract_id: ContractId, socket_id: SocketId) -> Self {
        Self::Sub(SubscriptionInfo {
            contract_id,
            socket_id: Some(socket_id),
        })
    }

    /// An `unsub` notification announcing that `socket_id` left `contract_id`.
    #[must_use]
    pub fn unsub_notification(contract_id: ContractId, socket_id: SocketId) -> Self {
        Self::Unsub(SubscriptionInfo {
            contract_id,
            socket_id: Some(socket_id),
        })
    }

    /// A `success` acknowledgment for the given request kind and contract.
    #[must_use]
    pub fn ack(request: RequestKind, contract_id: ContractId) -> Self {
        Self::Success(Ack {
            request,
            contract_id,
        })
    }

    /// The payload-free kind of this message.
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Ping(_) => MessageKind::Ping,
            Self::Pong(_) => MessageKind::Pong,
            Self::Sub(_) => MessageKind::Sub,
            Self::Unsub(_) => MessageKind::Unsub,
            Self::Pub(_) => MessageKind::Pub,
            Self::Entry(_) => MessageKind::Entry,
            Self::Success(_) => MessageKind::Success,
            Self::Error(_) => MessageKind::Error,
        }
    }

    /// Serialize to the JSON envelope.
    pub fn encode(&self) -> Result<String, ProtoError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Payload-free message kind. Keys the handler override maps on both halves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// `ping`
    Ping,
    /// `pong`
    Pong,
    /// `sub`
    Sub,
    /// `unsub`
    Unsub,
    /// `pub`
    Pub,
    /// `entry`
    Entry,
    /// `success`
    Success,
    /// `error`
    Error,
}

impl MessageKind {
    /// The lowercase wire tag for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Pong => "pong",
            Self::Sub => "sub",
            Self::Unsub => "unsub",
            Self::Pub => "pub",
            Self::Entry => "entry",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decode a frame into a [`Message`].
///
/// Validation happens in two stages. The envelope is checked first: the
/// frame must be a JSON object whose `type` field is a non-empty string,
/// anything else is [`ProtoError::Parse`]. A well-formed envelope whose tag
/// is outside the closed set fails with [`ProtoError::UnknownType`]; a known
/// tag with a payload that does not match its variant shape is again a
/// [`ProtoError::Parse`].
pub fn parse(raw: &str) -> Result<Message, ProtoError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| ProtoError::Parse(e.to_string()))?;
    let Some(envelope) = value.as_object() else {
        return Err(ProtoError::Parse("message is not a JSON object".into()));
    };
    let tag = match envelope.get("type").and_then(Value::as_str) {
        Some(tag) if !tag.is_empty() => tag,
        _ => {
            return Err(ProtoError::Parse(
                "message type must be a non-empty string".into(),
            ));
        }
    };
    if !KNOWN_TAGS.contains(&tag) {
        return Err(ProtoError::UnknownType(tag.to_owned()));
    }
    serde_json::from_value(value).map_err(|e| ProtoError::Parse(e.to_string()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
