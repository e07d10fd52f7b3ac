//! The cross-frame message set — the closed contract both sides speak.
//!
//! Every message crossing the frame boundary is one of these variants.
//! The set is deliberately closed: the original storefront passed
//! free-form `{ type: "..." }` objects around, which meant a typo'd type
//! silently did nothing and a crafted payload reached application code
//! unchecked. Here the boundary is a tagged enum — decoding *is*
//! validation, and an unknown tag or malformed shape never gets past the
//! codec.

use serde::{Deserialize, Serialize};

use crate::{AuthGrant, FrameSource, Principal};

/// A message crossing the frame boundary, internally tagged on the wire.
///
/// `#[serde(tag = "type")]` produces the JSON the embedded SDKs expect:
/// `{ "type": "REQUEST_AUTH_TOKEN", "source": "react-catalog" }`. The
/// tags are the historical wire names, kept verbatim (including the
/// Spanish cart event) so existing frames interoperate.
///
/// Direction and addressing:
///
/// | variant | direction | addressed? |
/// |---|---|---|
/// | `RequestAuthState` | frame → shell | — |
/// | `RequestAuthToken` | frame → shell | — |
/// | `AuthTokenResponse` | shell → frame | tagged with requester's `source` |
/// | `AuthSignedIn` / `AuthSignedOut` | shell → all frames | broadcast, untagged |
/// | domain messages | frame → siblings via shell | relayed opaquely |
///
/// Responses carry the requester's `source` because several embedded
/// clients can share one document; broadcasts are untagged because every
/// frame reacts identically to a global session change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CrossFrameMessage {
    /// Frame → shell: "tell me what you currently think the session is,
    /// no need to wait." Answered with `AuthSignedIn` or `AuthSignedOut`
    /// toward the requesting frame only.
    #[serde(rename = "REQUEST_AUTH_STATE")]
    RequestAuthState {
        /// Which embedded client is asking.
        source: FrameSource,
    },

    /// Frame → shell: "tell me the session and wait for a definite
    /// answer." Always answered with a tagged `AuthTokenResponse`.
    #[serde(rename = "REQUEST_AUTH_TOKEN")]
    RequestAuthToken {
        /// Which embedded client is asking (echoed back in the reply).
        source: FrameSource,
    },

    /// Shell → frame: reply to a token request. `grant` is `null` when
    /// there is no session. Posted origin-restricted to the requester —
    /// this is the only message carrying a bearer token.
    #[serde(rename = "AUTH_TOKEN_RESPONSE")]
    AuthTokenResponse {
        /// The requester this reply is addressed to.
        source: FrameSource,
        /// The session, or `null` for anonymous.
        grant: Option<AuthGrant>,
    },

    /// Shell → all frames: unsolicited notification of a new session.
    /// Carries the principal only; the token is retrieved separately via
    /// `RequestAuthToken` so the broadcast can safely go to any origin.
    #[serde(rename = "AUTH_SIGNED_IN")]
    AuthSignedIn {
        /// The newly signed-in user.
        user: Principal,
    },

    /// Shell → all frames: unsolicited notification that the session
    /// ended (explicit sign-out or terminal refresh failure — frames
    /// can't tell which, and aren't supposed to).
    #[serde(rename = "AUTH_SIGNED_OUT")]
    AuthSignedOut,

    // -- Domain messages, relayed opaquely between sibling frames --

    /// A product was added to the cart. (Historical wire name from the
    /// first storefront iteration.)
    #[serde(rename = "AGREGAR_AL_CARRITO")]
    AddToCart {
        source: FrameSource,
        product_id: String,
        quantity: u32,
    },

    /// A product was selected in the catalog.
    #[serde(rename = "PRODUCT_SELECTED")]
    ProductSelected {
        source: FrameSource,
        product_id: String,
    },

    /// A frame asks the shell's router to navigate.
    #[serde(rename = "NAVIGATE_TO")]
    NavigateTo {
        source: FrameSource,
        route: String,
    },

    /// A frame reports its rendered height so the shell can resize its
    /// iframe without scrollbars.
    #[serde(rename = "IFRAME_HEIGHT")]
    IframeHeight {
        source: FrameSource,
        height: u32,
    },
}

impl CrossFrameMessage {
    /// Returns the sending frame's source label, for variants that carry
    /// one. Broadcasts are untagged and return `None`.
    pub fn source(&self) -> Option<&FrameSource> {
        match self {
            Self::RequestAuthState { source }
            | Self::RequestAuthToken { source }
            | Self::AuthTokenResponse { source, .. }
            | Self::AddToCart { source, .. }
            | Self::ProductSelected { source, .. }
            | Self::NavigateTo { source, .. }
            | Self::IframeHeight { source, .. } => Some(source),
            Self::AuthSignedIn { .. } | Self::AuthSignedOut => None,
        }
    }

    /// Returns `true` for messages that belong to the auth protocol.
    ///
    /// Auth-typed messages arriving *from* an embedded frame are dropped
    /// by the shell: frames hold no write authority over the session.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::RequestAuthState { .. }
                | Self::RequestAuthToken { .. }
                | Self::AuthTokenResponse { .. }
                | Self::AuthSignedIn { .. }
                | Self::AuthSignedOut
        )
    }

    /// Returns `true` for domain messages the shell relays opaquely to
    /// sibling frames.
    pub fn is_relayable(&self) -> bool {
        !self.is_auth()
    }
}

// =========================================================================
// Tests
// =========================================================================
