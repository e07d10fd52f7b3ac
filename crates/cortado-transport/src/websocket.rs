//! WebSocket bridge for out-of-process frames, using `tokio-tungstenite`.
//!
//! Not every micro-frontend lives in the shell's document: a remote served
//! from another process (a module-federation dev server, a preview
//! environment) reaches the shell over a socket instead. Here the process
//! boundary stands in for the browser's origin enforcement: the connecting
//! frame announces its origin in a one-line preamble, the listener admits
//! only origins on its configured allowlist, and every delivery is stamped
//! with that validated origin — payloads still cannot forge the field.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::{Delivery, FrameChannel, FrameId, Origin, TargetOrigin, TransportError};

/// Counter for generating unique frame ids (bridge side).
static NEXT_BRIDGE_FRAME_ID: AtomicU64 = AtomicU64::new(1 << 32);

/// How long an accepted socket gets to announce its origin.
const PREAMBLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Listens for out-of-process frames connecting to the shell.
pub struct WebSocketFrameListener {
    listener: TcpListener,
    local_origin: Origin,
    allowed: Vec<Origin>,
}

impl WebSocketFrameListener {
    /// Binds a listener for the shell at `local_origin`, admitting only
    /// frames whose announced origin appears in `allowed`.
    pub async fn bind(
        addr: &str,
        local_origin: Origin,
        allowed: Vec<Origin>,
    ) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, origin = %local_origin, "frame bridge listening");
        Ok(Self {
            listener,
            local_origin,
            allowed,
        })
    }

    /// Returns the local address the bridge is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts the next frame connection.
    ///
    /// Performs the WebSocket handshake, then reads the origin preamble and
    /// checks it against the allowlist. A frame announcing an unknown
    /// origin is rejected with [`TransportError::OriginRejected`] — accept
    /// loops should log and keep accepting.
    pub async fn accept(
        &mut self,
    ) -> Result<WebSocketFrameChannel<TcpStream>, TransportError> {
        use futures_util::StreamExt;

        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let mut ws = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(|e| {
                TransportError::AcceptFailed(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    e,
                ))
            })?;

        // First text frame is the peer's announced origin.
        let announced = match tokio::time::timeout(PREAMBLE_TIMEOUT, ws.next())
            .await
        {
            Ok(Some(Ok(Message::Text(origin)))) => {
                Origin::new(origin.as_str())
            }
            Ok(Some(Ok(_))) | Ok(None) => {
                return Err(TransportError::OriginRejected(
                    "no origin preamble".into(),
                ));
            }
            Ok(Some(Err(e))) => {
                return Err(TransportError::ReceiveFailed(
                    std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        e,
                    ),
                ));
            }
            Err(_) => {
                return Err(TransportError::AcceptFailed(
                    std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        "origin preamble timed out",
                    ),
                ));
            }
        };

        if !self.allowed.contains(&announced) {
            tracing::warn!(%addr, origin = %announced, "rejecting frame");
            return Err(TransportError::OriginRejected(
                announced.as_str().to_string(),
            ));
        }

        let id = FrameId::new(
            NEXT_BRIDGE_FRAME_ID.fetch_add(1, Ordering::Relaxed),
        );
        tracing::debug!(%id, %addr, origin = %announced, "frame attached");

        Ok(WebSocketFrameChannel {
            id,
            local_origin: self.local_origin.clone(),
            peer_origin: announced,
            ws: Arc::new(Mutex::new(ws)),
        })
    }
}

/// A [`FrameChannel`] carried over a WebSocket.
pub struct WebSocketFrameChannel<S> {
    id: FrameId,
    local_origin: Origin,
    peer_origin: Origin,
    ws: Arc<Mutex<WebSocketStream<S>>>,
}

impl WebSocketFrameChannel<MaybeTlsStream<TcpStream>> {
    /// Connects an out-of-process frame to the shell's bridge.
    ///
    /// `local_origin` is announced in the preamble; `peer_origin` is the
    /// shell origin this frame expects (stamped on inbound deliveries and
    /// checked by the embedded client's mandatory origin filter).
    pub async fn connect(
        url: &str,
        local_origin: Origin,
        peer_origin: Origin,
    ) -> Result<Self, TransportError> {
        use futures_util::SinkExt;

        let (mut ws, _resp) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| {
                TransportError::AcceptFailed(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    e,
                ))
            })?;

        ws.send(Message::Text(local_origin.as_str().into()))
            .await
            .map_err(|e| {
                TransportError::SendFailed(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    e,
                ))
            })?;

        Ok(Self {
            id: FrameId::new(
                NEXT_BRIDGE_FRAME_ID.fetch_add(1, Ordering::Relaxed),
            ),
            local_origin,
            peer_origin,
            ws: Arc::new(Mutex::new(ws)),
        })
    }
}

impl<S> FrameChannel for WebSocketFrameChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    type Error = TransportError;

    async fn post(
        &self,
        data: &[u8],
        target: TargetOrigin,
    ) -> Result<(), Self::Error> {
        use futures_util::SinkExt;

        // Target enforcement happens on the sending side: the channel is
        // point-to-point, so a mismatch means the message never leaves.
        if !target.allows(&self.peer_origin) {
            tracing::debug!(
                peer = %self.peer_origin,
                "target origin mismatch, dropping post"
            );
            return Ok(());
        }

        let msg = Message::Binary(data.to_vec().into());
        self.ws.lock().await.send(msg).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    async fn recv(&self) -> Result<Option<Delivery>, Self::Error> {
        use futures_util::StreamExt;
        loop {
            let msg = self.ws.lock().await.next().await;
            match msg {
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(Delivery {
                        origin: self.peer_origin.clone(),
                        data: data.into(),
                    }));
                }
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(Delivery {
                        origin: self.peer_origin.clone(),
                        data: text.as_bytes().to_vec(),
                    }));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // skip ping/pong/frame
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(
                        std::io::Error::new(
                            std::io::ErrorKind::ConnectionReset,
                            e,
                        ),
                    ));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.ws.lock().await.close(None).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    fn id(&self) -> FrameId {
        self.id
    }

    fn peer_origin(&self) -> &Origin {
        &self.peer_origin
    }
}

impl<S> WebSocketFrameChannel<S> {
    /// Returns this end's own origin.
    pub fn local_origin(&self) -> &Origin {
        &self.local_origin
    }
}
