//! Cross-frame wire contract for Cortado.
//!
//! This crate defines the "language" that the shell and its embedded
//! micro-frontends speak across the frame boundary:
//!
//! - **Types** ([`CrossFrameMessage`], [`Principal`], [`AuthGrant`],
//!   [`FrameSource`]) — the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (frame channels carrying
//! bytes) and the auth layers (shell coordinator, embedded client). It
//! doesn't know about frames or sessions — it only knows how to serialize,
//! deserialize, and *validate* messages. Inbound bytes are parsed, never
//! trusted: anything that isn't a known message type in a known shape is
//! rejected before any other code touches it.
//!
//! ```text
//! Transport (Delivery bytes) → Protocol (CrossFrameMessage) → Shell/Client
//! ```

mod codec;
mod error;
mod message;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use message::CrossFrameMessage;
pub use types::{AuthGrant, FrameSource, Principal};
