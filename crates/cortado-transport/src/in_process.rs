//! In-process frame channels for frames hosted in the same document.
//!
//! The common deployment has every micro-frontend mounted in the same
//! page as the shell, so the "frame boundary" is a pair of linked mailboxes
//! rather than a socket. [`frame_pair`] builds exactly that: two
//! [`InProcessChannel`] ends wired crosswise over unbounded `mpsc` channels.
//!
//! Delivery rules match the browser:
//! - a post whose [`TargetOrigin`] does not allow the peer is dropped
//!   silently (not an error);
//! - every delivered message is stamped with the *sender's* origin, taken
//!   from the channel's own configuration, never from the payload.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, Mutex};

use crate::{Delivery, FrameChannel, FrameId, Origin, TargetOrigin, TransportError};

/// Counter for generating unique frame ids.
static NEXT_FRAME_ID: AtomicU64 = AtomicU64::new(1);

/// Creates a linked pair of in-process frame channels.
///
/// The first element is the end whose local origin is `a` (it sees `b` as
/// its peer); the second is the mirror image. For a shell at
/// `https://shop.example` embedding a cart frame at `https://cart.example`:
///
/// ```rust
/// use cortado_transport::{frame_pair, FrameChannel, Origin};
///
/// let (shell_end, cart_end) = frame_pair(
///     Origin::new("https://shop.example"),
///     Origin::new("https://cart.example"),
/// );
/// assert_eq!(shell_end.peer_origin().as_str(), "https://cart.example");
/// assert_eq!(cart_end.peer_origin().as_str(), "https://shop.example");
/// ```
pub fn frame_pair(a: Origin, b: Origin) -> (InProcessChannel, InProcessChannel) {
    let (a_to_b_tx, a_to_b_rx) = mpsc::unbounded_channel();
    let (b_to_a_tx, b_to_a_rx) = mpsc::unbounded_channel();

    let end_a = InProcessChannel {
        id: FrameId::new(NEXT_FRAME_ID.fetch_add(1, Ordering::Relaxed)),
        local_origin: a.clone(),
        peer_origin: b.clone(),
        tx: a_to_b_tx,
        rx: Mutex::new(b_to_a_rx),
    };
    let end_b = InProcessChannel {
        id: FrameId::new(NEXT_FRAME_ID.fetch_add(1, Ordering::Relaxed)),
        local_origin: b,
        peer_origin: a,
        tx: b_to_a_tx,
        rx: Mutex::new(a_to_b_rx),
    };

    (end_a, end_b)
}

/// One end of an in-process frame channel pair.
///
/// Cheap to share behind an `Arc`: posting clones nothing but the payload,
/// and receiving locks only this end's own inbox.
pub struct InProcessChannel {
    id: FrameId,
    local_origin: Origin,
    peer_origin: Origin,
    tx: mpsc::UnboundedSender<Delivery>,
    rx: Mutex<mpsc::UnboundedReceiver<Delivery>>,
}

impl InProcessChannel {
    /// Returns this end's own origin (stamped on outgoing deliveries).
    pub fn local_origin(&self) -> &Origin {
        &self.local_origin
    }
}

impl FrameChannel for InProcessChannel {
    type Error = TransportError;

    async fn post(
        &self,
        data: &[u8],
        target: TargetOrigin,
    ) -> Result<(), Self::Error> {
        if !target.allows(&self.peer_origin) {
            // Browser semantics: a targetOrigin mismatch drops the message
            // without notifying the sender.
            tracing::debug!(
                peer = %self.peer_origin,
                "target origin mismatch, dropping post"
            );
            return Ok(());
        }

        self.tx
            .send(Delivery {
                origin: self.local_origin.clone(),
                data: data.to_vec(),
            })
            .map_err(|_| {
                TransportError::ConnectionClosed(format!(
                    "peer frame {} is gone",
                    self.peer_origin
                ))
            })
    }

    async fn recv(&self) -> Result<Option<Delivery>, Self::Error> {
        Ok(self.rx.lock().await.recv().await)
    }

    async fn close(&self) -> Result<(), Self::Error> {
        // Closing this end's inbox is enough: the peer's next post fails
        // with ConnectionClosed and our next recv returns None.
        self.rx.lock().await.close();
        Ok(())
    }

    fn id(&self) -> FrameId {
        self.id
    }

    fn peer_origin(&self) -> &Origin {
        &self.peer_origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shop() -> Origin {
        Origin::new("https://shop.example")
    }

    fn cart() -> Origin {
        Origin::new("https://cart.example")
    }

    #[tokio::test]
    async fn test_post_any_target_delivers_with_sender_origin() {
        let (shell_end, cart_end) = frame_pair(shop(), cart());

        shell_end.post(b"hola", TargetOrigin::Any).await.unwrap();

        let delivery = cart_end.recv().await.unwrap().expect("delivery");
        assert_eq!(delivery.data, b"hola");
        // The stamped origin is the sender's, not the receiver's.
        assert_eq!(delivery.origin, shop());
    }

    #[tokio::test]
    async fn test_post_exact_matching_target_delivers() {
        let (shell_end, cart_end) = frame_pair(shop(), cart());

        shell_end
            .post(b"token", TargetOrigin::Exact(cart()))
            .await
            .unwrap();

        assert!(cart_end.recv().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_post_exact_mismatched_target_drops_silently() {
        let (shell_end, cart_end) = frame_pair(shop(), cart());

        // Posting with a target the peer doesn't satisfy is Ok(()) — the
        // message just never arrives.
        shell_end
            .post(
                b"token",
                TargetOrigin::Exact(Origin::new("https://evil.example")),
            )
            .await
            .unwrap();

        // A follow-up Any post must be the first thing the peer sees.
        shell_end.post(b"after", TargetOrigin::Any).await.unwrap();
        let delivery = cart_end.recv().await.unwrap().expect("delivery");
        assert_eq!(delivery.data, b"after");
    }

    #[tokio::test]
    async fn test_post_to_dropped_peer_returns_connection_closed() {
        let (shell_end, cart_end) = frame_pair(shop(), cart());
        drop(cart_end);

        let result = shell_end.post(b"anyone there", TargetOrigin::Any).await;

        assert!(
            matches!(result, Err(TransportError::ConnectionClosed(_))),
            "posting to a torn-down frame must surface ConnectionClosed"
        );
    }

    #[tokio::test]
    async fn test_recv_after_peer_dropped_returns_none() {
        let (shell_end, cart_end) = frame_pair(shop(), cart());
        shell_end.post(b"last words", TargetOrigin::Any).await.unwrap();
        drop(shell_end);

        // Queued message still arrives, then the channel reports closed.
        assert!(cart_end.recv().await.unwrap().is_some());
        assert!(cart_end.recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_close_stops_reception() {
        let (shell_end, cart_end) = frame_pair(shop(), cart());
        cart_end.close().await.unwrap();

        // recv drains to None once closed; posts from the peer fail.
        assert!(cart_end.recv().await.unwrap().is_none());
        assert!(shell_end.post(b"x", TargetOrigin::Any).await.is_err());
    }

    #[tokio::test]
    async fn test_pair_ends_have_distinct_ids() {
        let (a, b) = frame_pair(shop(), cart());
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn test_per_sender_ordering_is_preserved() {
        let (shell_end, cart_end) = frame_pair(shop(), cart());

        for i in 0..5u8 {
            shell_end.post(&[i], TargetOrigin::Any).await.unwrap();
        }
        for i in 0..5u8 {
            let delivery = cart_end.recv().await.unwrap().expect("delivery");
            assert_eq!(delivery.data, vec![i]);
        }
    }
}
