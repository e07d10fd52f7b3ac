//! Identity types shared across the frame boundary.
//!
//! These are the structures that cross the wire inside auth messages.
//! Note what is *absent*: the refresh token and expiry never leave the
//! shell. An embedded frame only ever sees a [`Principal`] and, on
//! request, a transient bearer token ([`AuthGrant`]).

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// FrameSource
// ---------------------------------------------------------------------------

/// Identifies which embedded client sent a message.
///
/// More than one micro-frontend can be listening in the same document
/// (the catalog widget and the recommendations widget, say), so replies
/// are tagged with the requester's source — an untagged reply would be
/// consumed ambiguously. Sources are free-form labels chosen by the host
/// page, conventionally `"{framework}-{widget}"` (`"react-catalog"`,
/// `"vue-cart"`).
///
/// `#[serde(transparent)]` keeps the wire form a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameSource(String);

impl FrameSource {
    /// Creates a source label.
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    /// Returns the label as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FrameSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Principal
// ---------------------------------------------------------------------------

/// The authenticated user's identity, absent any secret material.
///
/// Immutable once issued by the identity provider for the lifetime of a
/// session; replaced wholesale on re-authentication.
///
/// The display name is optional on the wire: when the provider supplies
/// none, [`Principal::name`] derives it from the email local-part
/// (`"a@b.com"` → `"a"`), and serialization omits the empty field rather
/// than shipping `""`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Stable identifier issued by the identity provider.
    pub id: String,
    /// The email the user signed up with.
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    name: String,
}

impl Principal {
    /// Creates a principal with no explicit display name.
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: String::new(),
        }
    }

    /// Sets an explicit display name (builder style).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns the display name, deriving it from the email local-part
    /// when the provider supplied none.
    pub fn name(&self) -> &str {
        if self.name.is_empty() {
            self.email.split('@').next().unwrap_or("")
        } else {
            &self.name
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user {}", self.id)
    }
}

// ---------------------------------------------------------------------------
// AuthGrant
// ---------------------------------------------------------------------------

/// The principal + bearer-token pair a frame holds transiently.
///
/// This is the payload of `AUTH_TOKEN_RESPONSE`: everything an embedded
/// frame needs to attach to a data-fetch call, and nothing it could use
/// to refresh or persist a session on its own. Frames re-request it on
/// every reload rather than storing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthGrant {
    /// Who the session belongs to.
    pub user: Principal,
    /// The current bearer token, valid until the shell rotates it.
    pub token: String,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_source_serializes_as_plain_string() {
        let json =
            serde_json::to_string(&FrameSource::new("react-catalog")).unwrap();
        assert_eq!(json, "\"react-catalog\"");
    }

    #[test]
    fn test_frame_source_display() {
        assert_eq!(FrameSource::new("vue-cart").to_string(), "vue-cart");
    }

    #[test]
    fn test_principal_name_derives_from_email_local_part() {
        let user = Principal::new("u1", "a@b.com");
        assert_eq!(user.name(), "a");
    }

    #[test]
    fn test_principal_explicit_name_wins_over_derivation() {
        let user = Principal::new("u1", "a@b.com").with_name("Amelia");
        assert_eq!(user.name(), "Amelia");
    }

    #[test]
    fn test_principal_serializes_without_empty_name() {
        // An unset name is omitted on the wire, not shipped as "".
        let user = Principal::new("u1", "a@b.com");
        let json: serde_json::Value = serde_json::to_value(&user).unwrap();
        assert_eq!(json["id"], "u1");
        assert_eq!(json["email"], "a@b.com");
        assert!(json.get("name").is_none());
    }

    #[test]
    fn test_principal_deserializes_without_name_field() {
        // The shape a broadcast carries: id + email only. The receiver
        // still gets a usable display name via derivation.
        let user: Principal =
            serde_json::from_str(r#"{"id":"u1","email":"a@b.com"}"#).unwrap();
        assert_eq!(user.name(), "a");
    }

    #[test]
    fn test_principal_round_trips_explicit_name() {
        let user = Principal::new("u2", "b@c.com").with_name("Bruno");
        let bytes = serde_json::to_vec(&user).unwrap();
        let decoded: Principal = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(user, decoded);
        assert_eq!(decoded.name(), "Bruno");
    }

    #[test]
    fn test_principal_display_shows_id_only() {
        // No email or token material in log output.
        let user = Principal::new("u1", "a@b.com");
        assert_eq!(user.to_string(), "user u1");
    }

    #[test]
    fn test_auth_grant_round_trip() {
        let grant = AuthGrant {
            user: Principal::new("u1", "a@b.com"),
            token: "t1".into(),
        };
        let bytes = serde_json::to_vec(&grant).unwrap();
        let decoded: AuthGrant = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(grant, decoded);
    }
}
