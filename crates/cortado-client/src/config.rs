//! Embedded client configuration.

use std::time::Duration;

use cortado_protocol::FrameSource;
use cortado_transport::Origin;

/// How long a token request waits before resolving to "no session".
/// The convention the storefront has always shipped with.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for one embedded auth client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// This frame's source label, echoed back in tagged replies so
    /// multiple embedded clients in one document don't consume each
    /// other's responses.
    pub source: FrameSource,

    /// The shell's origin. Inbound deliveries stamped with anything else
    /// are silently dropped — this filter is mandatory, not optional.
    pub shell_origin: Origin,

    /// Timeout for `get_current_user`. On expiry the call resolves to
    /// `None`; there is no automatic retry.
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Creates a config with the conventional 5-second timeout.
    pub fn new(source: FrameSource, shell_origin: Origin) -> Self {
        Self {
            source,
            shell_origin,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Overrides the request timeout (builder style).
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeout_is_five_seconds() {
        let config = ClientConfig::new(
            FrameSource::new("react-catalog"),
            Origin::new("https://shop.example"),
        );
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_with_request_timeout_overrides() {
        let config = ClientConfig::new(
            FrameSource::new("react-catalog"),
            Origin::new("https://shop.example"),
        )
        .with_request_timeout(Duration::from_millis(100));
        assert_eq!(config.request_timeout, Duration::from_millis(100));
    }
}
