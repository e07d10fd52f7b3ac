//! Cross-frame transport abstraction for Cortado.
//!
//! In the browser, the shell and its embedded micro-frontends are separate
//! execution contexts that can only talk through asynchronous message
//! passing (`window.postMessage`). This crate models that boundary:
//!
//! - [`FrameChannel`] — one end of a frame-to-frame message channel.
//! - [`Origin`] / [`TargetOrigin`] — the security identity of a frame, and
//!   who a posted message may be delivered to.
//! - [`Delivery`] — an inbound message, stamped with the *sender's* origin
//!   by the transport itself (never by the sender's payload).
//! - [`frame_pair`] — an in-process channel pair for frames hosted in the
//!   same document.
//!
//! # Feature Flags
//!
//! - `websocket` (default) — bridge for out-of-process frames via
//!   `tokio-tungstenite`

mod error;
mod in_process;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use in_process::{frame_pair, InProcessChannel};
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketFrameChannel, WebSocketFrameListener};

use std::fmt;

/// Opaque identifier for one frame attachment.
///
/// Frames come and go as the user navigates; each attachment gets a fresh
/// id from an atomic counter, so a torn-down frame's id is never reused
/// within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(u64);

impl FrameId {
    /// Creates a new `FrameId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame-{}", self.0)
    }
}

/// A frame's security origin, in serialized form (`scheme://host:port`).
///
/// This is the value the transport stamps on every [`Delivery`] and the
/// value receivers filter against. It is a plain newtype over `String` —
/// the transport layer does not parse or normalize it; equality is exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin(String);

impl Origin {
    /// Creates an origin from its serialized form.
    pub fn new(origin: impl Into<String>) -> Self {
        Self(origin.into())
    }

    /// Returns the serialized origin string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who a posted message may be delivered to.
///
/// Mirrors `postMessage`'s target-origin argument: a message posted with
/// [`TargetOrigin::Exact`] is dropped by the transport unless the peer's
/// origin matches; [`TargetOrigin::Any`] (`"*"` in the browser) delivers
/// regardless. The asymmetry is deliberate — token-bearing replies are
/// posted `Exact`, presence broadcasts `Any`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetOrigin {
    /// Deliver to any origin (the browser's `"*"`).
    Any,
    /// Deliver only if the peer's origin matches exactly.
    Exact(Origin),
}

impl TargetOrigin {
    /// Returns `true` if a peer with the given origin may receive the message.
    pub fn allows(&self, peer: &Origin) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(origin) => origin == peer,
        }
    }
}

/// An inbound message as the receiving frame sees it.
///
/// The `origin` field is stamped by the transport from its own knowledge of
/// who the peer is — it is *not* read from the payload, so a sender cannot
/// forge it. This is the only authentication the transport provides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// The sender's origin, as enforced by the transport.
    pub origin: Origin,
    /// The message payload (encoded by the protocol layer's codec).
    pub data: Vec<u8>,
}

/// One end of a frame-to-frame message channel.
///
/// Both the shell and each embedded frame hold one of these per
/// counterparty. `post` and `recv` take `&self` so a channel can be shared
/// between a pump task (receiving) and a coordinator (sending) behind an
/// `Arc`. The methods return explicitly `Send` futures because callers
/// are generic over the channel type and spawn onto Tokio.
pub trait FrameChannel: Send + Sync + 'static {
    /// The error type for channel operations.
    type Error: std::error::Error + Send + Sync;

    /// Posts a message toward the peer frame.
    ///
    /// If `target` does not allow the peer's origin the message is silently
    /// dropped, matching browser semantics — this is not an error. Posting
    /// to a peer that has been torn down returns
    /// [`TransportError::ConnectionClosed`]-shaped errors; callers log and
    /// skip, they never treat it as fatal.
    fn post(
        &self,
        data: &[u8],
        target: TargetOrigin,
    ) -> impl std::future::Future<Output = Result<(), Self::Error>> + Send;

    /// Receives the next delivery from the peer frame.
    ///
    /// Returns `Ok(None)` when the channel is cleanly closed (the peer
    /// frame navigated away or was unmounted).
    fn recv(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<Delivery>, Self::Error>>
    + Send;

    /// Closes the channel.
    fn close(
        &self,
    ) -> impl std::future::Future<Output = Result<(), Self::Error>> + Send;

    /// Returns the unique identifier for this channel end.
    fn id(&self) -> FrameId;

    /// Returns the origin of the frame on the other end.
    fn peer_origin(&self) -> &Origin;
}
