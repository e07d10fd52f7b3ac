//! The identity-provider hook: how the shell talks to the hosted
//! identity service.
//!
//! Cortado doesn't implement authentication itself — that's the remote
//! provider's job (Supabase, Firebase, a custom backend). This module
//! defines the [`IdentityProvider`] trait: the five operations the shell
//! needs, returning a [`Session`] or a categorized [`IdentityError`].
//! Production wires an HTTP-backed implementation; tests and demos use
//! [`MemoryIdentityProvider`](crate::MemoryIdentityProvider).
//!
//! The provider's internal token scheme is opaque here: tokens are
//! strings with an expiry, nothing more is assumed.

use std::future::Future;

use crate::{IdentityError, Session};

/// Optional profile fields collected at sign-up.
///
/// Kept minimal on purpose — catalog-facing profile data lives in the
/// data service, not the identity provider.
#[derive(Debug, Clone, Default)]
pub struct NewUserProfile {
    /// Display name; when absent, consumers derive one from the email
    /// local-part.
    pub name: Option<String>,
}

/// The remote identity service, seen from the shell.
///
/// # Trait bounds
///
/// - `Send + Sync + 'static` — the provider is owned by the coordinator
///   task and its futures cross `tokio::spawn`.
/// - Every method returns a `Send` future for the same reason, hence the
///   explicit `impl Future` form instead of `async fn`.
///
/// # Example
///
/// ```rust
/// use cortado_session::{
///     Credential, IdentityError, IdentityProvider, NewUserProfile,
///     Session, unix_now,
/// };
/// use cortado_protocol::Principal;
///
/// /// Accepts one hard-coded account. Development only.
/// struct SingleUserProvider;
///
/// impl IdentityProvider for SingleUserProvider {
///     async fn sign_in(
///         &self,
///         email: &str,
///         password: &str,
///     ) -> Result<Session, IdentityError> {
///         if email != "dev@shop.example" || password != "espresso" {
///             return Err(IdentityError::InvalidCredentials);
///         }
///         Ok(Session {
///             user: Principal::new("u-dev", email),
///             credential: Credential {
///                 access_token: "dev-access".into(),
///                 refresh_token: "dev-refresh".into(),
///                 expires_at: unix_now() + 3600,
///             },
///         })
///     }
///
///     async fn sign_up(
///         &self,
///         _email: &str,
///         _password: &str,
///         _profile: NewUserProfile,
///     ) -> Result<Session, IdentityError> {
///         Err(IdentityError::Provider("sign-up disabled".into()))
///     }
///
///     async fn sign_out(&self) -> Result<(), IdentityError> {
///         Ok(())
///     }
///
///     async fn get_session(
///         &self,
///     ) -> Result<Option<Session>, IdentityError> {
///         Ok(None)
///     }
///
///     async fn refresh_session(
///         &self,
///         _refresh_token: &str,
///     ) -> Result<Session, IdentityError> {
///         Err(IdentityError::InvalidCredentials)
///     }
/// }
/// ```
pub trait IdentityProvider: Send + Sync + 'static {
    /// Exchanges credentials for a session.
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Session, IdentityError>> + Send;

    /// Registers a new account and signs it in.
    fn sign_up(
        &self,
        email: &str,
        password: &str,
        profile: NewUserProfile,
    ) -> impl Future<Output = Result<Session, IdentityError>> + Send;

    /// Ends the provider-side session.
    fn sign_out(
        &self,
    ) -> impl Future<Output = Result<(), IdentityError>> + Send;

    /// Returns the provider's current session, if it holds one. Used at
    /// restore time to re-establish provider-side state for consistency.
    fn get_session(
        &self,
    ) -> impl Future<Output = Result<Option<Session>, IdentityError>> + Send;

    /// Exchanges a refresh token for a fresh session.
    fn refresh_session(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<Session, IdentityError>> + Send;
}

/// A shared provider is a provider. Lets callers keep a handle to the
/// instance they hand the coordinator (the in-memory provider's test
/// switches depend on this).
impl<P: IdentityProvider> IdentityProvider for std::sync::Arc<P> {
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Session, IdentityError>> + Send {
        (**self).sign_in(email, password)
    }

    fn sign_up(
        &self,
        email: &str,
        password: &str,
        profile: NewUserProfile,
    ) -> impl Future<Output = Result<Session, IdentityError>> + Send {
        (**self).sign_up(email, password, profile)
    }

    fn sign_out(
        &self,
    ) -> impl Future<Output = Result<(), IdentityError>> + Send {
        (**self).sign_out()
    }

    fn get_session(
        &self,
    ) -> impl Future<Output = Result<Option<Session>, IdentityError>> + Send
    {
        (**self).get_session()
    }

    fn refresh_session(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<Session, IdentityError>> + Send {
        (**self).refresh_session(refresh_token)
    }
}
