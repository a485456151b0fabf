//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding protocol messages.
///
/// A `ProtocolError` always means the bytes or their shape were wrong,
/// never that a draft rule was broken. Draft rule violations are reported
/// by `pokedrafter-draft` with their own error type.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Turning a value into bytes failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Turning bytes into a value failed: malformed JSON, a missing
    /// field, or an unknown `type` tag.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded fine but breaks a protocol rule, e.g. the
    /// first frame on a connection was not a handshake.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
