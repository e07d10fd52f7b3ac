//! Error type for the embedded client.
//!
//! Deliberately small: a missing session is `None`, a timeout is `None`,
//! an origin mismatch is silence. Errors exist only for things the
//! calling frame did wrong or genuinely broken plumbing.

use cortado_protocol::ProtocolError;

/// Errors from embedded-client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Encoding an outbound message failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The frame channel rejected a post (shell torn down, usually).
    #[error("frame channel error: {0}")]
    Channel(String),

    /// [`publish`](crate::EmbeddedAuthClient::publish) was handed an
    /// auth-typed message. Embedded frames never synthesize auth state.
    #[error("message type is not relayable")]
    NotRelayable,
}
