//! Unified error type for the Cortado stack.

use cortado_client::ClientError;
use cortado_protocol::ProtocolError;
use cortado_session::{IdentityError, StoreError};
use cortado_shell::ShellError;
use cortado_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `cortado` meta-crate, you deal with this single error
/// type; the `#[from]` impls let `?` convert layer errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum CortadoError {
    /// A transport-level error (frame channel, bridge socket).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A categorized identity-provider error.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// A credential-store error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A shell-coordinator error.
    #[error(transparent)]
    Shell(#[from] ShellError),

    /// An embedded-client error.
    #[error(transparent)]
    Client(#[from] ClientError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let cortado_err: CortadoError = err.into();
        assert!(matches!(cortado_err, CortadoError::Transport(_)));
        assert!(cortado_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let cortado_err: CortadoError = err.into();
        assert!(matches!(cortado_err, CortadoError::Protocol(_)));
    }

    #[test]
    fn test_from_identity_error() {
        let err = IdentityError::InvalidCredentials;
        let cortado_err: CortadoError = err.into();
        assert!(matches!(cortado_err, CortadoError::Identity(_)));
    }

    #[test]
    fn test_from_shell_error() {
        let err = ShellError::Unavailable;
        let cortado_err: CortadoError = err.into();
        assert!(matches!(cortado_err, CortadoError::Shell(_)));
    }

    #[test]
    fn test_from_client_error() {
        let err = ClientError::NotRelayable;
        let cortado_err: CortadoError = err.into();
        assert!(matches!(cortado_err, CortadoError::Client(_)));
    }
}
