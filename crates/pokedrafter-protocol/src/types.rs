//! Core protocol types: identities and the envelope that wraps every frame.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for an authenticated user.
///
/// Users take part in rooms as participants and moderators; inside a draft
/// the same id names a participant in the pick order.
///
/// `#[serde(transparent)]` keeps the wire form a plain number (`42`, not
/// `{"0":42}`). `Ord` lets ids key the `BTreeMap`s a draft record uses, so
/// serialized drafts have a stable field order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// A unique identifier for a room.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// A unique identifier for a draft (one live pick session in one room).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DraftId(pub u64);

impl fmt::Display for DraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D-{}", self.0)
    }
}

/// A unique identifier for a reusable draft template.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TemplateId(pub u64);

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// SystemMessage: connection-level messages
// ---------------------------------------------------------------------------

/// Messages that manage the connection itself rather than drafts.
///
/// Internally tagged: `{ "type": "Handshake", "version": 1, "token": "…" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SystemMessage {
    /// Client → Server: first frame on every connection.
    /// `token` is handed to the server's authenticator.
    Handshake { version: u32, token: Option<String> },

    /// Server → Client: the token was accepted and maps to `user_id`.
    HandshakeAck { user_id: UserId, server_time: u64 },

    /// Either direction: the sender is closing the connection.
    Disconnect { reason: String },

    /// Client → Server: keep-alive.
    Heartbeat { client_time: u64 },

    /// Server → Client: keep-alive echo.
    HeartbeatAck { client_time: u64, server_time: u64 },

    /// Server → Client: a request was rejected or could not be served.
    ///
    /// `code` follows HTTP conventions (400, 401, 403, 404, 409, 503).
    /// `kind` is a stable machine-readable name such as `NotYourTurn`
    /// or `PointLimitExceeded`; `message` carries the details.
    Error {
        code: u16,
        kind: String,
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// The content of an envelope.
///
/// Adjacently tagged: `{ "type": "System", "data": { … } }` or
/// `{ "type": "Api", "data": [123, …] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    /// A connection-level message.
    System(SystemMessage),

    /// An API request or reply, encoded by the codec. Opaque here; the
    /// server crate owns the request/reply types.
    Api(Vec<u8>),
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Every frame on the wire is an `Envelope`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Per-side sequence number.
    pub seq: u64,

    /// Milliseconds since the sender started.
    pub timestamp: u64,

    /// For replies: the `seq` of the request being answered.
    #[serde(default)]
    pub reply_to: Option<u64>,

    pub payload: Payload,
}
