//! Shell coordinator configuration.

/// Configuration for the shell coordinator.
///
/// The defaults encode the conventions the storefront has always run
/// with; they are knobs, not policy — the refresh itself stays a single
/// attempt with no backoff regardless of the leeway chosen.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// A credential expiring within this many seconds of "now" counts as
    /// imminent and triggers a lazy refresh when a token is demanded.
    pub refresh_leeway_secs: u64,

    /// Command mailbox capacity. Backpressure on a full mailbox is
    /// harmless — senders are async and the actor drains quickly.
    pub command_buffer: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            refresh_leeway_secs: 60,
            command_buffer: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ShellConfig::default();
        assert_eq!(config.refresh_leeway_secs, 60);
        assert_eq!(config.command_buffer, 64);
    }
}
