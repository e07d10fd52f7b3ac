//! Glue for frames hosted in the shell's own process.
//!
//! The common deployment mounts every micro-frontend in the same
//! document as the shell, so "attach a frame" means: build an in-process
//! channel pair, hand the shell its end, and spawn an embedded client on
//! the other. [`LocalFrame::attach`] does exactly that — it's what the
//! demo binary and the integration tests use, and what a host page's
//! bootstrap code would call once per mounted micro-frontend.

use std::sync::Arc;

use cortado_client::{ClientConfig, EmbeddedAuthClient};
use cortado_protocol::FrameSource;
use cortado_shell::{ShellError, ShellHandle};
use cortado_transport::{frame_pair, FrameId, InProcessChannel, Origin};

/// An embedded frame attached to the shell in-process.
pub struct LocalFrame {
    /// The shell's id for this attachment (for explicit detach).
    pub frame_id: FrameId,
    /// The frame-side auth client.
    pub client: EmbeddedAuthClient<InProcessChannel>,
}

impl LocalFrame {
    /// Attaches a frame with the conventional client config (5 s
    /// request timeout).
    pub async fn attach(
        shell: &ShellHandle<InProcessChannel>,
        shell_origin: Origin,
        frame_origin: Origin,
        source: FrameSource,
    ) -> Result<Self, ShellError> {
        let config = ClientConfig::new(source, shell_origin.clone());
        Self::attach_with_config(shell, shell_origin, frame_origin, config)
            .await
    }

    /// Attaches a frame with a custom [`ClientConfig`].
    pub async fn attach_with_config(
        shell: &ShellHandle<InProcessChannel>,
        shell_origin: Origin,
        frame_origin: Origin,
        config: ClientConfig,
    ) -> Result<Self, ShellError> {
        let (shell_end, frame_end) = frame_pair(shell_origin, frame_origin);
        let frame_id = shell.attach_frame(Arc::new(shell_end)).await?;
        let client = EmbeddedAuthClient::spawn(Arc::new(frame_end), config);
        Ok(Self { frame_id, client })
    }

    /// Detaches from the shell (the client keeps answering from cache
    /// until dropped, as a real frame would during teardown).
    pub async fn detach(
        &self,
        shell: &ShellHandle<InProcessChannel>,
    ) -> Result<(), ShellError> {
        shell.detach_frame(self.frame_id).await
    }
}
