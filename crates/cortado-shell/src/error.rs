//! Error type for shell-side auth operations.

use cortado_session::{IdentityError, StoreError};

/// Errors surfaced to the shell's own UI.
///
/// Identity errors stay on this side of the frame boundary by
/// construction: nothing in the cross-frame message set can carry one.
/// An embedded frame only ever observes the resulting state.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    /// A categorized identity-provider failure (bad credentials,
    /// unconfirmed email, duplicate registration, weak password,
    /// provider down). Shown inline in the shell's auth UI.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// The durable credential store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The coordinator task is gone (shutdown or panic). Callers treat
    /// this like "anonymous, and stop asking".
    #[error("shell coordinator is unavailable")]
    Unavailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_identity_error() {
        let err: ShellError = IdentityError::InvalidCredentials.into();
        assert!(matches!(err, ShellError::Identity(_)));
        assert_eq!(err.to_string(), "invalid credentials");
    }

    #[test]
    fn test_from_store_error() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        let err: ShellError = StoreError::Write(io).into();
        assert!(matches!(err, ShellError::Store(_)));
    }
}
