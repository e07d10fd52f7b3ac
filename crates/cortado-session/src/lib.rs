//! Session management for Cortado's shell.
//!
//! This crate owns everything about *who is signed in*:
//!
//! 1. **Session data** — [`Credential`], [`Session`], and the
//!    single-writer [`SessionState`] lifecycle machine.
//! 2. **Persistence** — the durable local record ([`SessionRecord`])
//!    behind the [`CredentialStore`] trait, so a session survives shell
//!    reloads.
//! 3. **Identity** — the [`IdentityProvider`] trait wrapping the remote
//!    identity service, and the [`IdentityGateway`] that emits
//!    [`SessionChange`] events the coordinator turns into cross-frame
//!    broadcasts.
//!
//! # How it fits in the stack
//!
//! ```text
//! Shell coordinator (above)  ← sole writer of SessionState
//!     ↕
//! Session layer (this crate) ← session data, persistence, identity calls
//!     ↕
//! Protocol layer (below)     ← Principal, AuthGrant wire types
//! ```
//!
//! Nothing in this crate is reachable from an embedded frame: credentials
//! and refresh tokens live on the shell side of the boundary only.

mod error;
mod gateway;
mod memory;
mod provider;
mod session;
mod store;

pub use error::{IdentityError, StoreError};
pub use gateway::{IdentityGateway, SessionChange};
pub use memory::MemoryIdentityProvider;
pub use provider::{IdentityProvider, NewUserProfile};
pub use session::{unix_now, Credential, Session, SessionState};
pub use store::{
    CredentialStore, FileCredentialStore, MemoryCredentialStore,
    SessionRecord,
};
