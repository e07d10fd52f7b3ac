//! Error types for the session layer.

/// Categorized errors from the identity provider.
///
/// These surface only at the shell's own sign-in/sign-up call sites —
/// they never cross the frame boundary. An embedded frame only ever
/// learns "authenticated" or "not authenticated", never *why* an attempt
/// failed.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// Wrong email/password combination (or an unknown refresh token).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The account exists but its email was never confirmed.
    #[error("email not confirmed")]
    EmailNotConfirmed,

    /// Sign-up with an email that is already registered.
    #[error("email already registered")]
    AlreadyRegistered,

    /// Sign-up rejected because the password is too weak.
    #[error("password too weak")]
    WeakPassword,

    /// The provider could not be reached at all. Distinct from a
    /// rejection: the stored refresh token may still be good, so restore
    /// logic keeps the persisted record on this variant.
    #[error("identity provider unreachable: {0}")]
    Unreachable(String),

    /// Any other provider-side failure.
    #[error("identity provider error: {0}")]
    Provider(String),
}

impl IdentityError {
    /// Returns `true` when the failure says nothing about the
    /// credential's validity — the provider just wasn't there.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }
}

/// Errors from the durable credential store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading the record failed.
    #[error("failed to read session record: {0}")]
    Read(#[source] std::io::Error),

    /// Writing or deleting the record failed.
    #[error("failed to write session record: {0}")]
    Write(#[source] std::io::Error),

    /// The record exists but doesn't parse. Treated like an absent
    /// record by restore logic (fall back to anonymous), never a panic.
    #[error("corrupt session record: {0}")]
    Corrupt(#[source] serde_json::Error),
}
