//! The shell auth coordinator for Cortado.
//!
//! The coordinator is the single source of truth for the session. It runs
//! as an isolated Tokio task (actor model) owning the [`SessionState`],
//! the credential store, the identity gateway, and the registry of
//! attached frames — no shared mutable state, just message passing.
//!
//! # Key types
//!
//! - [`ShellHandle`] — send commands to the running coordinator
//! - [`ShellConfig`] — refresh leeway, mailbox sizing
//! - [`ShellError`] — what the shell's own UI sees on failure
//!
//! Everything an embedded frame learns about the session, it learns from
//! this actor's replies and broadcasts.
//!
//! [`SessionState`]: cortado_session::SessionState

mod config;
mod coordinator;
mod error;

pub use config::ShellConfig;
pub use coordinator::ShellHandle;
pub use error::ShellError;
