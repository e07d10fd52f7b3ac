//! Error types for the protocol layer.
//!
//! Each crate in Cortado defines its own error enum. When you see a
//! `ProtocolError`, the problem is in serialization, deserialization, or
//! message validation — not in frame plumbing or session management.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed bytes, a shape mismatch, or an
    /// unknown message type tag. At the frame boundary this is the normal
    /// fate of hostile or stale input — log at debug level and drop.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded but violates a protocol rule — e.g. an
    /// auth-typed message arriving from an embedded frame.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
