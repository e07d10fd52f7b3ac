//! Codec trait and implementations for serializing/deserializing messages.
//!
//! A codec converts between Rust types and the raw bytes a frame channel
//! carries. The protocol layer doesn't care HOW messages are serialized —
//! it just needs something that implements the [`Codec`] trait, so the
//! wire format stays swappable without touching the shell or the clients.
//!
//! Currently we provide [`JsonCodec`]: the browser side of the bridge is
//! JavaScript, and structured-clone-friendly JSON is what `postMessage`
//! payloads look like in practice anyway.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because the codec is shared by long-lived
/// async tasks (the shell coordinator and every frame pump).
///
/// Decoding doubles as boundary validation: `decode::<CrossFrameMessage>`
/// on hostile input fails, it never produces a half-formed message.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed,
    /// incomplete, or don't match the expected shape — including an
    /// unknown message type tag.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use cortado_protocol::{Codec, CrossFrameMessage, FrameSource, JsonCodec};
///
/// let codec = JsonCodec;
///
/// let msg = CrossFrameMessage::RequestAuthToken {
///     source: FrameSource::new("react-catalog"),
/// };
///
/// let bytes = codec.encode(&msg).unwrap();
/// let decoded: CrossFrameMessage = codec.decode(&bytes).unwrap();
/// assert_eq!(msg, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
