//! In-memory identity provider for demos and tests.
//!
//! Behaves like a miniature hosted provider: registered accounts, random
//! opaque tokens, refresh-token rotation, and the full error taxonomy —
//! without a network. A switchable "unreachable" mode and a refresh-call
//! counter make the shell's failure paths testable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use cortado_protocol::Principal;
use rand::Rng;

use crate::{
    Credential, IdentityError, IdentityProvider, NewUserProfile, Session,
    unix_now,
};

/// Minimum password length the dev provider accepts at sign-up.
const MIN_PASSWORD_LEN: usize = 8;

/// Default lifetime of minted access tokens, in seconds.
const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone)]
struct Account {
    id: String,
    password: String,
    confirmed: bool,
}

/// An in-memory [`IdentityProvider`].
pub struct MemoryIdentityProvider {
    accounts: Mutex<HashMap<String, Account>>,
    /// Outstanding refresh tokens → account email. Rotated on use,
    /// revoked on sign-out.
    refresh_tokens: Mutex<HashMap<String, String>>,
    active: Mutex<Option<Session>>,
    unreachable: AtomicBool,
    refresh_calls: AtomicU32,
    token_ttl_secs: u64,
    next_account_id: AtomicU32,
}

impl MemoryIdentityProvider {
    /// Creates an empty provider with the default token lifetime.
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            refresh_tokens: Mutex::new(HashMap::new()),
            active: Mutex::new(None),
            unreachable: AtomicBool::new(false),
            refresh_calls: AtomicU32::new(0),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            next_account_id: AtomicU32::new(1),
        }
    }

    /// Overrides the minted token lifetime (useful for expiry tests).
    pub fn with_token_ttl(mut self, secs: u64) -> Self {
        self.token_ttl_secs = secs;
        self
    }

    /// Registers a confirmed account.
    pub fn register_user(&self, email: &str, password: &str) {
        self.insert_account(email, password, true);
    }

    /// Registers an account whose email was never confirmed.
    pub fn register_unconfirmed(&self, email: &str, password: &str) {
        self.insert_account(email, password, false);
    }

    /// Toggles the "provider is down" mode: every call fails with
    /// [`IdentityError::Unreachable`] while set.
    pub fn set_unreachable(&self, down: bool) {
        self.unreachable.store(down, Ordering::SeqCst);
    }

    /// Number of `refresh_session` calls received so far.
    pub fn refresh_calls(&self) -> u32 {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    fn insert_account(&self, email: &str, password: &str, confirmed: bool) {
        let id = format!(
            "u-{}",
            self.next_account_id.fetch_add(1, Ordering::Relaxed)
        );
        self.accounts.lock().expect("accounts mutex poisoned").insert(
            email.to_string(),
            Account {
                id,
                password: password.to_string(),
                confirmed,
            },
        );
    }

    fn check_reachable(&self) -> Result<(), IdentityError> {
        if self.unreachable.load(Ordering::SeqCst) {
            Err(IdentityError::Unreachable(
                "provider offline (simulated)".into(),
            ))
        } else {
            Ok(())
        }
    }

    /// Mints a session for an account and records its refresh token.
    fn open_session(&self, email: &str, account_id: &str) -> Session {
        let session = Session {
            user: Principal::new(account_id, email),
            credential: Credential {
                access_token: mint_token(),
                refresh_token: mint_token(),
                expires_at: unix_now() + self.token_ttl_secs,
            },
        };
        self.refresh_tokens
            .lock()
            .expect("refresh mutex poisoned")
            .insert(session.credential.refresh_token.clone(), email.to_string());
        *self.active.lock().expect("active mutex poisoned") =
            Some(session.clone());
        session
    }
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, IdentityError> {
        self.check_reachable()?;

        let account = {
            let accounts =
                self.accounts.lock().expect("accounts mutex poisoned");
            accounts.get(email).cloned()
        };

        let account = account.ok_or(IdentityError::InvalidCredentials)?;
        if account.password != password {
            return Err(IdentityError::InvalidCredentials);
        }
        if !account.confirmed {
            return Err(IdentityError::EmailNotConfirmed);
        }

        Ok(self.open_session(email, &account.id))
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        _profile: NewUserProfile,
    ) -> Result<Session, IdentityError> {
        self.check_reachable()?;

        if password.len() < MIN_PASSWORD_LEN {
            return Err(IdentityError::WeakPassword);
        }
        {
            let accounts =
                self.accounts.lock().expect("accounts mutex poisoned");
            if accounts.contains_key(email) {
                return Err(IdentityError::AlreadyRegistered);
            }
        }

        // Dev provider: accounts are auto-confirmed and signed straight in.
        self.insert_account(email, password, true);
        let account_id = {
            let accounts =
                self.accounts.lock().expect("accounts mutex poisoned");
            accounts
                .get(email)
                .expect("just inserted")
                .id
                .clone()
        };
        Ok(self.open_session(email, &account_id))
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.check_reachable()?;

        let ended =
            self.active.lock().expect("active mutex poisoned").take();
        if let Some(session) = ended {
            // Revoke the outstanding refresh token.
            self.refresh_tokens
                .lock()
                .expect("refresh mutex poisoned")
                .remove(&session.credential.refresh_token);
        }
        Ok(())
    }

    async fn get_session(&self) -> Result<Option<Session>, IdentityError> {
        self.check_reachable()?;
        Ok(self.active.lock().expect("active mutex poisoned").clone())
    }

    async fn refresh_session(
        &self,
        refresh_token: &str,
    ) -> Result<Session, IdentityError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;

        let email = {
            let mut tokens = self
                .refresh_tokens
                .lock()
                .expect("refresh mutex poisoned");
            // Rotation: a refresh token is single-use.
            tokens
                .remove(refresh_token)
                .ok_or(IdentityError::InvalidCredentials)?
        };

        let account_id = {
            let accounts =
                self.accounts.lock().expect("accounts mutex poisoned");
            accounts
                .get(&email)
                .ok_or(IdentityError::InvalidCredentials)?
                .id
                .clone()
        };

        Ok(self.open_session(&email, &account_id))
    }
}

/// Generates a random 32-character hex string (128 bits of entropy) —
/// an opaque stand-in for whatever the hosted provider mints.
fn mint_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// =========================================================================
// Tests
// =========================================================================
