//! Session types: the data structures that represent an authenticated user.
//!
//! A "session" pairs WHO the user is (a [`Principal`]) with the secret
//! material proving it (a [`Credential`]), wrapped in a lifecycle state
//! machine ([`SessionState`]) that only the shell coordinator may advance.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use cortado_protocol::{AuthGrant, Principal};

/// Returns the current wall-clock time as seconds since the Unix epoch.
///
/// Expiry checks take `now` as a parameter so they stay pure and
/// testable; this is the value callers pass in production.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

/// The secret material proving a principal's session.
///
/// Owned exclusively by the shell. Embedded frames never see the refresh
/// token or expiry — they receive the bearer token transiently, inside an
/// [`AuthGrant`], and re-request it on every reload.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Opaque bearer token attached to data-fetch calls.
    pub access_token: String,
    /// Opaque token exchanged for a fresh credential when this one expires.
    pub refresh_token: String,
    /// Absolute expiry, seconds since the Unix epoch.
    pub expires_at: u64,
}

impl Credential {
    /// Returns `true` if the credential has expired as of `now`.
    pub fn is_expired(&self, now: u64) -> bool {
        self.expires_at <= now
    }

    /// Returns `true` if the credential expires within `leeway` seconds
    /// of `now` — the "expiry is imminent" trigger for a lazy refresh.
    pub fn expires_within(&self, leeway: u64, now: u64) -> bool {
        self.expires_at <= now.saturating_add(leeway)
    }
}

/// Token material stays out of logs: Debug prints expiry only.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A principal plus the credential proving it.
///
/// Created when the shell restores a persisted record at startup or the
/// identity provider accepts a sign-in; destroyed on sign-out or terminal
/// refresh failure. Replaced wholesale on re-authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// The authenticated user.
    pub user: Principal,
    /// The secret material backing the session.
    pub credential: Credential,
}

impl Session {
    /// Builds the transient principal + bearer-token pair handed to an
    /// embedded frame. Deliberately drops the refresh token and expiry.
    pub fn grant(&self) -> AuthGrant {
        AuthGrant {
            user: self.user.clone(),
            token: self.credential.access_token.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The session lifecycle machine. Single writer: the shell coordinator.
///
/// ```text
///              signIn attempt            success
///   Anonymous ───────────────► Authenticating ─────► Authenticated
///       ▲                           │                    │      ▲
///       │           failure         │       expiry       │      │ success
///       ├───────────────────────────┘      detected      ▼      │
///       │                                            Refreshing ┘
///       │              failure                           │
///       ├────────────────────────────────────────────────┘
///       │              explicit signOut
///       └──────────────────────────────── Authenticated
/// ```
///
/// There is no terminal state — the machine cycles for the lifetime of
/// the application. `Refreshing` keeps the outgoing session so a racing
/// query can still answer with *something* coherent (last-write-wins).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No session. The initial state, pending restore-from-storage.
    #[default]
    Anonymous,
    /// A sign-in attempt is in flight at the identity provider.
    Authenticating,
    /// A live session.
    Authenticated(Session),
    /// The credential expired (or is about to); a refresh is in flight.
    /// Holds the session being replaced.
    Refreshing(Session),
}

impl SessionState {
    /// Returns the session if one exists in this state.
    ///
    /// `Refreshing` still answers with the outgoing session: a refresh in
    /// flight is not "signed out".
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated(session) | Self::Refreshing(session) => {
                Some(session)
            }
            Self::Anonymous | Self::Authenticating => None,
        }
    }

    /// Returns the signed-in principal, if any.
    pub fn user(&self) -> Option<&Principal> {
        self.session().map(|s| &s.user)
    }

    /// Returns `true` if a session is live (including mid-refresh).
    pub fn is_authenticated(&self) -> bool {
        self.session().is_some()
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => write!(f, "anonymous"),
            Self::Authenticating => write!(f, "authenticating"),
            Self::Authenticated(_) => write!(f, "authenticated"),
            Self::Refreshing(_) => write!(f, "refreshing"),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
