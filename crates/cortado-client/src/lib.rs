//! The embedded auth client for Cortado micro-frontends.
//!
//! One [`EmbeddedAuthClient`] runs inside each embedded frame, whatever
//! its view framework. It holds *no write authority* over the session —
//! it asks the shell, caches the last-known answer, and notifies its
//! frame's view layer when new state arrives. Framework adapters (a React
//! hook, an Angular service, a Vue composable) are thin consumers of this
//! type's public interface.
//!
//! # Key types
//!
//! - [`EmbeddedAuthClient`] — request/cache/notify, one per frame
//! - [`ClientConfig`] — source label, shell origin, request timeout
//! - [`CachedAuthState`] — the frame-local view of the session
//! - [`AuthEvent`] / [`Subscription`] — the observer surface
//!
//! The mandatory origin filter lives here: every inbound delivery is
//! checked against the configured shell origin before it is even decoded.

mod client;
mod config;
mod error;
mod subscription;

pub use client::{AuthEvent, CachedAuthState, EmbeddedAuthClient};
pub use config::ClientConfig;
pub use error::ClientError;
pub use subscription::Subscription;
