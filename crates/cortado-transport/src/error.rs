/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The peer frame has been torn down (navigation or unmount).
    /// During a broadcast this is caught and logged per-recipient,
    /// never fatal to the broadcaster.
    #[error("frame channel closed: {0}")]
    ConnectionClosed(String),

    /// Sending a message failed.
    #[error("post failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving a message failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding or accepting bridge connections failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// A connecting frame announced an origin the listener does not admit.
    #[error("origin not allowed: {0}")]
    OriginRejected(String),
}
