//! The identity gateway: provider calls plus session-changed events.
//!
//! The gateway wraps an [`IdentityProvider`] and emits a [`SessionChange`]
//! after every successful mutating call. The shell coordinator subscribes
//! and turns those in-process events into cross-frame broadcasts — which
//! keeps "what changed the session" and "tell the frames" decoupled, the
//! same shape as the provider SDKs' own `onAuthStateChange` hook.

use tokio::sync::broadcast;

use crate::{
    IdentityError, IdentityProvider, NewUserProfile, Session,
};

/// Capacity of the event channel. Events are tiny and consumed promptly
/// by the coordinator's select loop; lagging only drops the oldest.
const EVENT_BUFFER: usize = 16;

/// An in-process session-changed event.
#[derive(Debug, Clone)]
pub enum SessionChange {
    /// A sign-in or sign-up succeeded.
    SignedIn(Session),
    /// A refresh succeeded; same principal, fresh credential.
    Refreshed(Session),
    /// The session ended.
    SignedOut,
}

/// Wraps the identity provider and publishes [`SessionChange`] events.
///
/// Mutating calls (`sign_in`, `sign_up`, `sign_out`, `refresh_session`)
/// emit after the provider succeeds; `get_session` is read-only and
/// emits nothing.
pub struct IdentityGateway<P: IdentityProvider> {
    provider: P,
    events: broadcast::Sender<SessionChange>,
}

impl<P: IdentityProvider> IdentityGateway<P> {
    /// Wraps a provider.
    pub fn new(provider: P) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self { provider, events }
    }

    /// Subscribes to session-changed events. Each receiver sees every
    /// event sent after its subscription.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.events.subscribe()
    }

    /// Signs in, emitting [`SessionChange::SignedIn`] on success.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, IdentityError> {
        let session = self.provider.sign_in(email, password).await?;
        tracing::debug!(user = %session.user, "provider accepted sign-in");
        let _ = self.events.send(SessionChange::SignedIn(session.clone()));
        Ok(session)
    }

    /// Signs up, emitting [`SessionChange::SignedIn`] on success.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        profile: NewUserProfile,
    ) -> Result<Session, IdentityError> {
        let session =
            self.provider.sign_up(email, password, profile).await?;
        tracing::debug!(user = %session.user, "provider accepted sign-up");
        let _ = self.events.send(SessionChange::SignedIn(session.clone()));
        Ok(session)
    }

    /// Signs out, emitting [`SessionChange::SignedOut`].
    ///
    /// The event fires even if the provider call fails: locally the
    /// session is gone either way, and the frames must hear about it.
    pub async fn sign_out(&self) -> Result<(), IdentityError> {
        let result = self.provider.sign_out().await;
        let _ = self.events.send(SessionChange::SignedOut);
        result
    }

    /// Returns the provider's current session. Read-only, no event.
    pub async fn get_session(
        &self,
    ) -> Result<Option<Session>, IdentityError> {
        self.provider.get_session().await
    }

    /// Refreshes, emitting [`SessionChange::Refreshed`] on success.
    /// Failure emits nothing — the coordinator owns the sign-out path.
    pub async fn refresh_session(
        &self,
        refresh_token: &str,
    ) -> Result<Session, IdentityError> {
        let session =
            self.provider.refresh_session(refresh_token).await?;
        tracing::debug!(user = %session.user, "provider refreshed session");
        let _ = self
            .events
            .send(SessionChange::Refreshed(session.clone()));
        Ok(session)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryIdentityProvider;

    fn gateway() -> IdentityGateway<MemoryIdentityProvider> {
        let provider = MemoryIdentityProvider::new();
        provider.register_user("a@b.com", "ristretto");
        IdentityGateway::new(provider)
    }

    #[tokio::test]
    async fn test_sign_in_emits_signed_in_event() {
        let gw = gateway();
        let mut events = gw.subscribe();

        let session = gw.sign_in("a@b.com", "ristretto").await.unwrap();

        match events.try_recv().unwrap() {
            SessionChange::SignedIn(s) => assert_eq!(s, session),
            other => panic!("expected SignedIn, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_sign_in_emits_nothing() {
        let gw = gateway();
        let mut events = gw.subscribe();

        let result = gw.sign_in("a@b.com", "wrong").await;

        assert!(result.is_err());
        assert!(events.try_recv().is_err(), "no event on failure");
    }

    #[tokio::test]
    async fn test_sign_out_emits_signed_out_event() {
        let gw = gateway();
        gw.sign_in("a@b.com", "ristretto").await.unwrap();
        let mut events = gw.subscribe();

        gw.sign_out().await.unwrap();

        assert!(matches!(
            events.try_recv().unwrap(),
            SessionChange::SignedOut
        ));
    }

    #[tokio::test]
    async fn test_refresh_emits_refreshed_event() {
        let gw = gateway();
        let session = gw.sign_in("a@b.com", "ristretto").await.unwrap();
        let mut events = gw.subscribe();

        let refreshed = gw
            .refresh_session(&session.credential.refresh_token)
            .await
            .unwrap();

        match events.try_recv().unwrap() {
            SessionChange::Refreshed(s) => {
                assert_eq!(s, refreshed);
                assert_eq!(s.user, session.user, "same principal");
                assert_ne!(
                    s.credential.access_token,
                    session.credential.access_token,
                    "fresh credential"
                );
            }
            other => panic!("expected Refreshed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_session_emits_nothing() {
        let gw = gateway();
        gw.sign_in("a@b.com", "ristretto").await.unwrap();
        let mut events = gw.subscribe();

        let _ = gw.get_session().await.unwrap();

        assert!(events.try_recv().is_err(), "read-only call, no event");
    }

    #[tokio::test]
    async fn test_events_reach_subscribers_registered_before_send() {
        // The broadcast-after-mutation invariant the shell relies on:
        // a subscriber registered at send time sees the event.
        let gw = gateway();
        let mut first = gw.subscribe();
        let mut second = gw.subscribe();

        gw.sign_in("a@b.com", "ristretto").await.unwrap();

        assert!(first.try_recv().is_ok());
        assert!(second.try_recv().is_ok());
    }
}
