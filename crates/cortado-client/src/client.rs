//! The embedded auth client: request, cache, notify.
//!
//! Lifecycle: [`EmbeddedAuthClient::spawn`] starts one inbound task that
//! filters, decodes, and applies every delivery from the shell. The
//! client itself is a thin façade over shared state — a tri-state cache,
//! a waiter list for in-flight token requests, and two listener
//! registries. All of it dies with the frame (dropping the client aborts
//! the inbound task); nothing is persisted frame-side, ever.
//!
//! Concurrency note: the shared state sits behind a plain `std::sync`
//! mutex and is never held across an await. Listeners are invoked after
//! the lock is released, so a callback may re-enter the client freely.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use cortado_protocol::{
    AuthGrant, Codec, CrossFrameMessage, JsonCodec, Principal,
};
use cortado_transport::{Delivery, FrameChannel, TargetOrigin};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::subscription::ListenerKind;
use crate::{ClientConfig, ClientError, Subscription};

/// The frame-local view of the shell's session.
///
/// Tri-state on purpose: a frame that has heard nothing yet must ask,
/// while a frame that heard `AUTH_SIGNED_OUT` answers "no session" from
/// cache without re-querying. A signed-in broadcast carries no token, so
/// the token slot is optional and filled lazily by a tagged response.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedAuthState {
    /// No definitive answer has arrived since this frame loaded.
    Unknown,
    /// The shell said signed-in. `token` is present only once a token
    /// response has been consumed.
    SignedIn {
        user: Principal,
        token: Option<String>,
    },
    /// The shell said signed-out.
    SignedOut,
}

/// What auth listeners are told when new state arrives.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    /// A session is live.
    SignedIn { user: Principal },
    /// There is no session.
    SignedOut,
}

type AuthListener = Arc<dyn Fn(&AuthEvent) + Send + Sync>;
type FrameListener = Arc<dyn Fn(&CrossFrameMessage) + Send + Sync>;

/// Shared mutable state between the client façade and its inbound task.
pub(crate) struct Inner {
    cached: CachedAuthState,
    /// Callers suspended in `get_current_user`. A second concurrent call
    /// while a request is in flight joins this list instead of issuing a
    /// duplicate — every waiter is resolved by the one response, none is
    /// ever displaced.
    waiters: Vec<oneshot::Sender<Option<AuthGrant>>>,
    request_in_flight: bool,
    pub(crate) auth_listeners: HashMap<u64, AuthListener>,
    pub(crate) frame_listeners: HashMap<u64, FrameListener>,
    next_listener_id: u64,
}

impl Inner {
    fn new() -> Self {
        Self {
            cached: CachedAuthState::Unknown,
            waiters: Vec::new(),
            request_in_flight: false,
            auth_listeners: HashMap::new(),
            frame_listeners: HashMap::new(),
            next_listener_id: 1,
        }
    }
}

/// An embedded frame's eventually-consistent view of the shell session.
pub struct EmbeddedAuthClient<C: FrameChannel> {
    channel: Arc<C>,
    config: ClientConfig,
    codec: JsonCodec,
    inner: Arc<Mutex<Inner>>,
    inbound: JoinHandle<()>,
}

impl<C: FrameChannel> EmbeddedAuthClient<C> {
    /// Starts a client over `channel` and begins processing inbound
    /// deliveries immediately.
    pub fn spawn(channel: Arc<C>, config: ClientConfig) -> Self {
        let inner = Arc::new(Mutex::new(Inner::new()));
        let inbound = tokio::spawn(run_inbound(
            Arc::clone(&channel),
            config.clone(),
            Arc::clone(&inner),
        ));
        Self {
            channel,
            config,
            codec: JsonCodec,
            inner,
            inbound,
        }
    }

    /// Returns the session's principal and bearer token, or `None`.
    ///
    /// Answers from cache when the cache is definite. Otherwise posts
    /// `REQUEST_AUTH_TOKEN` and suspends until the tagged response
    /// arrives or the configured timeout elapses — a timeout resolves to
    /// `None` (absence of a session is a normal outcome, not an error)
    /// and is not retried; the next explicit call asks again.
    pub async fn get_current_user(&self) -> Option<AuthGrant> {
        let (rx, should_send) = {
            let mut inner =
                self.inner.lock().expect("client mutex poisoned");
            match &inner.cached {
                CachedAuthState::SignedOut => return None,
                CachedAuthState::SignedIn {
                    user,
                    token: Some(token),
                } => {
                    return Some(AuthGrant {
                        user: user.clone(),
                        token: token.clone(),
                    });
                }
                // Unknown, or signed-in without a token yet: ask.
                _ => {}
            }

            let (tx, rx) = oneshot::channel();
            inner.waiters.push(tx);
            let should_send = !inner.request_in_flight;
            inner.request_in_flight = true;
            (rx, should_send)
        };

        if should_send {
            let request = CrossFrameMessage::RequestAuthToken {
                source: self.config.source.clone(),
            };
            if let Err(e) = self.post(&request).await {
                tracing::debug!(error = %e, "token request not sent");
                // Let the timeout resolve this caller; clear the flag so
                // the next call can try the post again.
                self.inner
                    .lock()
                    .expect("client mutex poisoned")
                    .request_in_flight = false;
            }
        }

        match tokio::time::timeout(self.config.request_timeout, rx).await {
            Ok(Ok(grant)) => grant,
            // Timed out, or the inbound task is gone: no session, no
            // dangling future, no retry.
            Ok(Err(_)) | Err(_) => {
                self.inner
                    .lock()
                    .expect("client mutex poisoned")
                    .request_in_flight = false;
                None
            }
        }
    }

    /// Fire-and-forget: asks the shell for current state at startup. The
    /// answer reaches subscribers through the notify path only.
    pub async fn request_auth_state(&self) -> Result<(), ClientError> {
        self.post(&CrossFrameMessage::RequestAuthState {
            source: self.config.source.clone(),
        })
        .await
    }

    /// Registers a listener invoked on every definitive state arrival —
    /// tagged responses and unsolicited broadcasts alike. Multiple
    /// listeners are independent; drop the [`Subscription`] to remove.
    pub fn on_auth_state_change(
        &self,
        listener: impl Fn(&AuthEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let mut inner = self.inner.lock().expect("client mutex poisoned");
        let id = inner.next_listener_id;
        inner.next_listener_id += 1;
        inner.auth_listeners.insert(id, Arc::new(listener));
        Subscription {
            id,
            kind: ListenerKind::Auth,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Registers a listener for relayed domain messages (cart events,
    /// navigation, sizing) arriving from sibling frames via the shell.
    pub fn on_frame_message(
        &self,
        listener: impl Fn(&CrossFrameMessage) + Send + Sync + 'static,
    ) -> Subscription {
        let mut inner = self.inner.lock().expect("client mutex poisoned");
        let id = inner.next_listener_id;
        inner.next_listener_id += 1;
        inner.frame_listeners.insert(id, Arc::new(listener));
        Subscription {
            id,
            kind: ListenerKind::Frame,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Sends a domain message to the shell for relay to sibling frames.
    ///
    /// # Errors
    /// [`ClientError::NotRelayable`] for auth-typed messages: an embedded
    /// frame never synthesizes auth state.
    pub async fn publish(
        &self,
        msg: CrossFrameMessage,
    ) -> Result<(), ClientError> {
        if !msg.is_relayable() {
            return Err(ClientError::NotRelayable);
        }
        self.post(&msg).await
    }

    /// Returns the current frame-local cache (for adapters that render
    /// synchronously from last-known state).
    pub fn cached_state(&self) -> CachedAuthState {
        self.inner
            .lock()
            .expect("client mutex poisoned")
            .cached
            .clone()
    }

    /// Number of live listeners across both registries. Frame-lifecycle
    /// tests assert this returns to zero.
    pub fn listener_count(&self) -> usize {
        let inner = self.inner.lock().expect("client mutex poisoned");
        inner.auth_listeners.len() + inner.frame_listeners.len()
    }

    async fn post(&self, msg: &CrossFrameMessage) -> Result<(), ClientError> {
        let bytes = self.codec.encode(msg)?;
        self.channel
            .post(
                &bytes,
                TargetOrigin::Exact(self.config.shell_origin.clone()),
            )
            .await
            .map_err(|e| ClientError::Channel(e.to_string()))
    }
}

impl<C: FrameChannel> Drop for EmbeddedAuthClient<C> {
    fn drop(&mut self) {
        // The frame is going away; stop listening.
        self.inbound.abort();
    }
}

// ---------------------------------------------------------------------------
// Inbound task
// ---------------------------------------------------------------------------

/// Receives until the channel closes, applying each delivery.
async fn run_inbound<C: FrameChannel>(
    channel: Arc<C>,
    config: ClientConfig,
    inner: Arc<Mutex<Inner>>,
) {
    loop {
        match channel.recv().await {
            Ok(Some(delivery)) => {
                apply_delivery(&config, &inner, delivery);
            }
            Ok(None) => {
                tracing::debug!("shell channel closed");
                break;
            }
            Err(e) => {
                tracing::debug!(error = %e, "shell channel recv error");
                break;
            }
        }
    }

    // Nothing more can arrive: release anyone still suspended rather
    // than making them ride out the full timeout.
    let waiters = {
        let mut inner = inner.lock().expect("client mutex poisoned");
        inner.request_in_flight = false;
        std::mem::take(&mut inner.waiters)
    };
    for waiter in waiters {
        let _ = waiter.send(None);
    }
}

/// Filters, decodes, and applies one delivery.
fn apply_delivery(
    config: &ClientConfig,
    inner: &Arc<Mutex<Inner>>,
    delivery: Delivery,
) {
    // The mandatory origin filter, before anything is decoded. A
    // mismatch changes no state and fires no listener.
    if delivery.origin != config.shell_origin {
        tracing::debug!(
            origin = %delivery.origin,
            "origin mismatch, dropping delivery"
        );
        return;
    }

    let msg: CrossFrameMessage = match JsonCodec.decode(&delivery.data) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::debug!(error = %e, "undecodable delivery, dropping");
            return;
        }
    };

    match msg {
        // The tagged reply to our own token request. Responses addressed
        // to other sources in the same document are not ours to consume.
        CrossFrameMessage::AuthTokenResponse { source, grant }
            if source == config.source =>
        {
            let event = match &grant {
                Some(g) => AuthEvent::SignedIn {
                    user: g.user.clone(),
                },
                None => AuthEvent::SignedOut,
            };
            let (waiters, listeners) = {
                let mut inner =
                    inner.lock().expect("client mutex poisoned");
                inner.cached = match &grant {
                    Some(g) => CachedAuthState::SignedIn {
                        user: g.user.clone(),
                        token: Some(g.token.clone()),
                    },
                    None => CachedAuthState::SignedOut,
                };
                inner.request_in_flight = false;
                (
                    std::mem::take(&mut inner.waiters),
                    auth_listeners(&inner),
                )
            };
            // Every waiter gets the same answer — idempotent resolution,
            // no caller is ever displaced by a concurrent request.
            for waiter in waiters {
                let _ = waiter.send(grant.clone());
            }
            notify(&listeners, &event);
        }

        CrossFrameMessage::AuthTokenResponse { source, .. } => {
            tracing::debug!(%source, "token response for another client");
        }

        // Unsolicited broadcast: a new session exists. No token rides
        // along — it is fetched on demand — so any cached token is
        // stale and dropped.
        CrossFrameMessage::AuthSignedIn { user } => {
            let event = AuthEvent::SignedIn { user: user.clone() };
            let listeners = {
                let mut inner =
                    inner.lock().expect("client mutex poisoned");
                inner.cached = CachedAuthState::SignedIn {
                    user,
                    token: None,
                };
                auth_listeners(&inner)
            };
            notify(&listeners, &event);
        }

        // Unsolicited broadcast: the session is gone. Suspended token
        // requests resolve to "no session" — the shell won't be
        // answering them with anything else.
        CrossFrameMessage::AuthSignedOut => {
            let (waiters, listeners) = {
                let mut inner =
                    inner.lock().expect("client mutex poisoned");
                inner.cached = CachedAuthState::SignedOut;
                inner.request_in_flight = false;
                (
                    std::mem::take(&mut inner.waiters),
                    auth_listeners(&inner),
                )
            };
            for waiter in waiters {
                let _ = waiter.send(None);
            }
            notify(&listeners, &AuthEvent::SignedOut);
        }

        // Relayed domain traffic from sibling frames.
        msg if msg.is_relayable() => {
            let listeners = {
                let inner = inner.lock().expect("client mutex poisoned");
                inner
                    .frame_listeners
                    .values()
                    .cloned()
                    .collect::<Vec<_>>()
            };
            for listener in &listeners {
                listener(&msg);
            }
        }

        // Requests are frame→shell; one arriving here is misrouted.
        msg => {
            tracing::debug!("unexpected message for a frame: {msg:?}");
        }
    }
}

fn auth_listeners(inner: &Inner) -> Vec<AuthListener> {
    inner.auth_listeners.values().cloned().collect()
}

/// Listeners run outside the lock so they may re-enter the client.
fn notify(listeners: &[AuthListener], event: &AuthEvent) {
    for listener in listeners {
        listener(event);
    }
}
