//! # Cortado
//!
//! Cross-frame auth bridge for micro-frontend storefronts.
//!
//! One shell frame owns the session; any number of embedded
//! micro-frontends (React, Angular, Vue — Cortado doesn't care) observe
//! it through a small, closed message protocol over the frame boundary.
//! The shell is the single writer; embedded frames get an
//! eventually-consistent, read-only view plus on-demand bearer tokens.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cortado::prelude::*;
//!
//! # async fn run() -> Result<(), CortadoError> {
//! // The shell: identity provider + credential store + coordinator.
//! let provider = MemoryIdentityProvider::new();
//! provider.register_user("barista@shop.example", "portafilter");
//! let shell = ShellHandle::spawn(
//!     provider,
//!     FileCredentialStore::new("/tmp/cortado-session.json"),
//!     ShellConfig::default(),
//! );
//!
//! // An embedded frame, attached in-process.
//! let frame = LocalFrame::attach(
//!     &shell,
//!     Origin::new("https://shop.example"),
//!     Origin::new("https://catalog.example"),
//!     FrameSource::new("react-catalog"),
//! )
//! .await?;
//!
//! // The frame's view layer subscribes and asks.
//! let _sub = frame.client.on_auth_state_change(|event| {
//!     println!("auth changed: {event:?}");
//! });
//! shell.sign_in("barista@shop.example", "portafilter").await?;
//! let grant = frame.client.get_current_user().await;
//! # let _ = grant;
//! # Ok(())
//! # }
//! ```

mod error;
mod local;

pub use error::CortadoError;
pub use local::LocalFrame;

/// The working set, one import away.
pub mod prelude {
    pub use cortado_client::{
        AuthEvent, CachedAuthState, ClientConfig, ClientError,
        EmbeddedAuthClient, Subscription,
    };
    pub use cortado_protocol::{
        AuthGrant, Codec, CrossFrameMessage, FrameSource, JsonCodec,
        Principal, ProtocolError,
    };
    pub use cortado_session::{
        unix_now, Credential, CredentialStore, FileCredentialStore,
        IdentityError, IdentityGateway, IdentityProvider,
        MemoryCredentialStore, MemoryIdentityProvider, NewUserProfile,
        Session, SessionChange, SessionRecord, SessionState, StoreError,
    };
    pub use cortado_shell::{ShellConfig, ShellError, ShellHandle};
    pub use cortado_transport::{
        frame_pair, Delivery, FrameChannel, FrameId, InProcessChannel,
        Origin, TargetOrigin, TransportError,
    };
    #[cfg(feature = "websocket")]
    pub use cortado_transport::{
        WebSocketFrameChannel, WebSocketFrameListener,
    };

    pub use crate::{CortadoError, LocalFrame};
}

/// Re-export the `websocket` feature of the transport crate.
#[cfg(feature = "websocket")]
pub use cortado_transport::{WebSocketFrameChannel, WebSocketFrameListener};
