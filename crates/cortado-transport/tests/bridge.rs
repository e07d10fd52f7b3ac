//! Integration tests for the WebSocket frame bridge.
//!
//! These spin up a real listener and client socket to verify the origin
//! preamble, the allowlist, origin stamping, and the target-origin rules
//! end to end — the same guarantees the in-process pair provides, but
//! across a process boundary.

#[cfg(feature = "websocket")]
mod bridge {
    use cortado_transport::{
        FrameChannel, Origin, TargetOrigin, TransportError,
        WebSocketFrameChannel, WebSocketFrameListener,
    };

    fn shell() -> Origin {
        Origin::new("https://shop.example")
    }

    fn catalog() -> Origin {
        Origin::new("https://catalog.example")
    }

    /// Binds a listener on a random port and returns it with its URL.
    async fn bind_bridge(
        allowed: Vec<Origin>,
    ) -> (WebSocketFrameListener, String) {
        let listener =
            WebSocketFrameListener::bind("127.0.0.1:0", shell(), allowed)
                .await
                .expect("should bind");
        let addr = listener.local_addr().expect("local addr");
        (listener, format!("ws://{addr}"))
    }

    #[tokio::test]
    async fn test_bridge_attach_and_round_trip() {
        let (mut listener, url) = bind_bridge(vec![catalog()]).await;

        let accept = tokio::spawn(async move {
            listener.accept().await.expect("should accept")
        });
        let frame_end =
            WebSocketFrameChannel::connect(&url, catalog(), shell())
                .await
                .expect("should connect");
        let shell_end = accept.await.expect("task should complete");

        // The shell end knows the frame by its validated origin.
        assert_eq!(shell_end.peer_origin(), &catalog());

        // Shell → frame, stamped with the shell's origin.
        shell_end
            .post(b"state", TargetOrigin::Exact(catalog()))
            .await
            .expect("post should succeed");
        let delivery = frame_end.recv().await.unwrap().expect("delivery");
        assert_eq!(delivery.data, b"state");
        assert_eq!(delivery.origin, shell());

        // Frame → shell, stamped with the frame's origin.
        frame_end
            .post(b"request", TargetOrigin::Exact(shell()))
            .await
            .expect("post should succeed");
        let delivery = shell_end.recv().await.unwrap().expect("delivery");
        assert_eq!(delivery.data, b"request");
        assert_eq!(delivery.origin, catalog());
    }

    #[tokio::test]
    async fn test_bridge_rejects_unlisted_origin() {
        let (mut listener, url) = bind_bridge(vec![catalog()]).await;

        let accept = tokio::spawn(async move { listener.accept().await });
        let _frame = WebSocketFrameChannel::connect(
            &url,
            Origin::new("https://evil.example"),
            shell(),
        )
        .await
        .expect("socket itself connects");

        let result = accept.await.expect("task should complete");
        assert!(
            matches!(result, Err(TransportError::OriginRejected(_))),
            "unlisted origin must be rejected at attach"
        );
    }

    #[tokio::test]
    async fn test_bridge_post_with_mismatched_target_never_arrives() {
        let (mut listener, url) = bind_bridge(vec![catalog()]).await;

        let accept = tokio::spawn(async move {
            listener.accept().await.expect("should accept")
        });
        let frame_end =
            WebSocketFrameChannel::connect(&url, catalog(), shell())
                .await
                .expect("should connect");
        let shell_end = accept.await.expect("task should complete");

        // Mismatched target: dropped on the sending side, no error.
        shell_end
            .post(
                b"secret",
                TargetOrigin::Exact(Origin::new("https://cart.example")),
            )
            .await
            .expect("drop is not an error");

        // The next matching post is the first thing the frame sees.
        shell_end
            .post(b"public", TargetOrigin::Any)
            .await
            .expect("post should succeed");
        let delivery = frame_end.recv().await.unwrap().expect("delivery");
        assert_eq!(delivery.data, b"public");
    }

    #[tokio::test]
    async fn test_bridge_recv_returns_none_on_peer_close() {
        let (mut listener, url) = bind_bridge(vec![catalog()]).await;

        let accept = tokio::spawn(async move {
            listener.accept().await.expect("should accept")
        });
        let frame_end =
            WebSocketFrameChannel::connect(&url, catalog(), shell())
                .await
                .expect("should connect");
        let shell_end = accept.await.expect("task should complete");

        frame_end.close().await.expect("close should succeed");

        let result = shell_end.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on peer close");
    }
}
