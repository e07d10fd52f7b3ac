//! The coordinator actor: session ownership, frame registry, broadcasts.
//!
//! One Tokio task owns everything mutable — the [`SessionState`], the
//! credential store, the identity gateway, and the map of attached
//! frames. The outside world (the shell's own UI, and one pump task per
//! attached frame) talks to it through an mpsc command channel; replies
//! travel back on oneshots. That single mailbox is what makes the
//! "at-most-one-writer" invariant hold: every session transition happens
//! inside this task, in mailbox order.
//!
//! ```text
//!  shell UI ──SignIn/SignOut──►┐
//!  frame pump ──FrameInbound──►│ coordinator ──post/broadcast──► frames
//!  gateway ──SessionChange────►┘
//! ```
//!
//! Cross-frame requests are answered from whatever the state is at the
//! moment the command is processed (last-write-wins, no locking); a
//! requester racing a sign-in may transiently see anonymous, and the
//! following `AUTH_SIGNED_IN` broadcast corrects it.

use std::collections::HashMap;
use std::sync::Arc;

use cortado_protocol::{Codec, CrossFrameMessage, JsonCodec, Principal};
use cortado_session::{
    unix_now, CredentialStore, IdentityGateway, IdentityProvider,
    NewUserProfile, Session, SessionChange, SessionRecord, SessionState,
};
use cortado_transport::{Delivery, FrameChannel, FrameId, TargetOrigin};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::{ShellConfig, ShellError};

/// Commands sent to the coordinator actor through its mailbox.
pub(crate) enum ShellCommand<C: FrameChannel> {
    /// Attempt a sign-in at the identity provider.
    SignIn {
        email: String,
        password: String,
        reply: oneshot::Sender<Result<Principal, ShellError>>,
    },

    /// Register a new account and sign it in.
    SignUp {
        email: String,
        password: String,
        profile: NewUserProfile,
        reply: oneshot::Sender<Result<Principal, ShellError>>,
    },

    /// End the session everywhere.
    SignOut {
        reply: oneshot::Sender<Result<(), ShellError>>,
    },

    /// Read the current session state (side-effect-free).
    CurrentState {
        reply: oneshot::Sender<SessionState>,
    },

    /// Demand a currently-valid bearer token, refreshing lazily if the
    /// credential is expired or about to be.
    AccessToken {
        reply: oneshot::Sender<Option<String>>,
    },

    /// Register an embedded frame's channel.
    AttachFrame {
        channel: Arc<C>,
        reply: oneshot::Sender<FrameId>,
    },

    /// Remove a frame (explicit, or because its channel closed).
    DetachFrame { frame_id: FrameId },

    /// An inbound delivery from an attached frame.
    FrameInbound {
        frame_id: FrameId,
        delivery: Delivery,
    },

    /// Stop the actor.
    Shutdown,
}

/// Handle to the running coordinator. Cheap to clone — it's just an
/// `mpsc::Sender` wrapper. This is the whole shell-side API.
pub struct ShellHandle<C: FrameChannel> {
    tx: mpsc::Sender<ShellCommand<C>>,
}

// Manual impl: `#[derive(Clone)]` would demand `C: Clone` for no reason.
impl<C: FrameChannel> Clone for ShellHandle<C> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<C: FrameChannel> ShellHandle<C> {
    /// Spawns a coordinator actor and returns its handle.
    ///
    /// The actor restores any persisted session before processing its
    /// first command; callers never see a half-restored state, and
    /// nothing blocks — early queries simply queue on the mailbox.
    pub fn spawn<P, S>(provider: P, store: S, config: ShellConfig) -> Self
    where
        P: IdentityProvider,
        S: CredentialStore,
    {
        let (tx, rx) = mpsc::channel(config.command_buffer);
        let gateway = IdentityGateway::new(provider);
        let events = gateway.subscribe();

        let actor = ShellCoordinator {
            state: SessionState::Anonymous,
            gateway,
            store,
            codec: JsonCodec,
            config,
            frames: HashMap::new(),
            commands: rx,
            command_tx: tx.clone(),
            events,
        };

        tokio::spawn(actor.run());

        Self { tx }
    }

    /// Signs in with email and password.
    ///
    /// # Errors
    /// Returns the categorized [`ShellError::Identity`] on rejection —
    /// this is the only place identity failures surface; they never
    /// cross the frame boundary.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Principal, ShellError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(ShellCommand::SignIn {
                email: email.to_string(),
                password: password.to_string(),
                reply,
            })
            .await
            .map_err(|_| ShellError::Unavailable)?;
        rx.await.map_err(|_| ShellError::Unavailable)?
    }

    /// Registers a new account and signs it in.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        profile: NewUserProfile,
    ) -> Result<Principal, ShellError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(ShellCommand::SignUp {
                email: email.to_string(),
                password: password.to_string(),
                profile,
                reply,
            })
            .await
            .map_err(|_| ShellError::Unavailable)?;
        rx.await.map_err(|_| ShellError::Unavailable)?
    }

    /// Signs out everywhere. Always succeeds locally; a provider-side
    /// failure is logged, not surfaced — the session is gone either way.
    pub async fn sign_out(&self) -> Result<(), ShellError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(ShellCommand::SignOut { reply })
            .await
            .map_err(|_| ShellError::Unavailable)?;
        rx.await.map_err(|_| ShellError::Unavailable)?
    }

    /// Returns the current session state.
    pub async fn current_state(&self) -> Result<SessionState, ShellError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(ShellCommand::CurrentState { reply })
            .await
            .map_err(|_| ShellError::Unavailable)?;
        rx.await.map_err(|_| ShellError::Unavailable)
    }

    /// Returns a currently-valid bearer token, or `None` when anonymous.
    ///
    /// This is the lazy-refresh entry point for shell-side data fetches:
    /// an expired or imminently-expiring credential is refreshed (once,
    /// no backoff) before answering.
    pub async fn access_token(&self) -> Result<Option<String>, ShellError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(ShellCommand::AccessToken { reply })
            .await
            .map_err(|_| ShellError::Unavailable)?;
        rx.await.map_err(|_| ShellError::Unavailable)
    }

    /// Attaches an embedded frame's channel and starts pumping its
    /// inbound messages into the coordinator.
    pub async fn attach_frame(
        &self,
        channel: Arc<C>,
    ) -> Result<FrameId, ShellError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(ShellCommand::AttachFrame { channel, reply })
            .await
            .map_err(|_| ShellError::Unavailable)?;
        rx.await.map_err(|_| ShellError::Unavailable)
    }

    /// Detaches a frame. Detaching an unknown frame is a no-op.
    pub async fn detach_frame(
        &self,
        frame_id: FrameId,
    ) -> Result<(), ShellError> {
        self.tx
            .send(ShellCommand::DetachFrame { frame_id })
            .await
            .map_err(|_| ShellError::Unavailable)
    }

    /// Stops the coordinator.
    pub async fn shutdown(&self) -> Result<(), ShellError> {
        self.tx
            .send(ShellCommand::Shutdown)
            .await
            .map_err(|_| ShellError::Unavailable)
    }
}

/// A registered frame: its channel plus the pump task feeding us.
struct FrameBinding<C: FrameChannel> {
    channel: Arc<C>,
    pump: JoinHandle<()>,
}

/// The internal coordinator state. Runs inside a Tokio task.
struct ShellCoordinator<P, S, C>
where
    P: IdentityProvider,
    S: CredentialStore,
    C: FrameChannel,
{
    state: SessionState,
    gateway: IdentityGateway<P>,
    store: S,
    codec: JsonCodec,
    config: ShellConfig,
    frames: HashMap<FrameId, FrameBinding<C>>,
    commands: mpsc::Receiver<ShellCommand<C>>,
    /// Cloned into each frame's pump task.
    command_tx: mpsc::Sender<ShellCommand<C>>,
    events: broadcast::Receiver<SessionChange>,
}

impl<P, S, C> ShellCoordinator<P, S, C>
where
    P: IdentityProvider,
    S: CredentialStore,
    C: FrameChannel,
{
    /// Runs the actor: restore first, then the command/event loop.
    async fn run(mut self) {
        self.restore().await;
        tracing::info!(state = %self.state, "shell coordinator ready");

        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => {
                        if self.handle_command(cmd).await {
                            break;
                        }
                    }
                    None => break,
                },
                event = self.events.recv() => match event {
                    Ok(change) => self.announce(change).await,
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "session events lagged");
                    }
                    // The gateway (and its sender) live in `self`, so the
                    // channel can only close when we're being torn down.
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }

        for (frame_id, binding) in self.frames.drain() {
            tracing::debug!(%frame_id, "detaching frame on shutdown");
            binding.pump.abort();
        }
        tracing::info!("shell coordinator stopped");
    }

    // -- Startup restore ---------------------------------------------------

    /// Attempts to adopt a persisted session. Completes (or fails safely
    /// to anonymous) before the first command is answered.
    async fn restore(&mut self) {
        let record = match self.store.load() {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "could not read session record, starting anonymous");
                return;
            }
        };
        let Some(record) = record else {
            tracing::debug!("no persisted session");
            return;
        };

        if record.expires_at > unix_now() {
            // Unexpired: adopt without contacting the provider, then
            // re-establish the provider-side session for consistency
            // (best-effort — an offline provider must not block startup).
            let session = record.into_session();
            tracing::info!(user = %session.user, "session restored from storage");
            self.state = SessionState::Authenticated(session.clone());
            if let Err(e) = self.gateway.get_session().await {
                tracing::debug!(error = %e, "provider session re-establishment failed");
            }
            self.broadcast(&CrossFrameMessage::AuthSignedIn {
                user: session.user,
            })
            .await;
            return;
        }

        // Expired: exactly one refresh attempt, never a loop.
        tracing::info!("persisted session expired, attempting refresh");
        match self.gateway.refresh_session(&record.refresh_token).await {
            Ok(session) => {
                self.persist(&session);
                self.state = SessionState::Authenticated(session);
                // The gateway's Refreshed event queues the broadcast.
            }
            Err(e) if e.is_unreachable() => {
                // Says nothing about the token's validity; keep the
                // record for the next launch and start anonymous.
                tracing::warn!(error = %e, "provider unreachable during restore, starting anonymous");
            }
            Err(e) => {
                tracing::info!(error = %e, "refresh rejected, clearing persisted session");
                if let Err(e) = self.store.clear() {
                    tracing::warn!(error = %e, "failed to clear session record");
                }
            }
        }
    }

    // -- Command handling --------------------------------------------------

    /// Processes one command. Returns `true` when the actor should stop.
    async fn handle_command(&mut self, cmd: ShellCommand<C>) -> bool {
        match cmd {
            ShellCommand::SignIn {
                email,
                password,
                reply,
            } => {
                let result = self.sign_in(&email, &password).await;
                let _ = reply.send(result);
            }

            ShellCommand::SignUp {
                email,
                password,
                profile,
                reply,
            } => {
                let result = self.sign_up(&email, &password, profile).await;
                let _ = reply.send(result);
            }

            ShellCommand::SignOut { reply } => {
                self.sign_out().await;
                let _ = reply.send(Ok(()));
            }

            ShellCommand::CurrentState { reply } => {
                let _ = reply.send(self.state.clone());
            }

            ShellCommand::AccessToken { reply } => {
                self.ensure_fresh_credential().await;
                let token = self
                    .state
                    .session()
                    .map(|s| s.credential.access_token.clone());
                let _ = reply.send(token);
            }

            ShellCommand::AttachFrame { channel, reply } => {
                let frame_id = self.attach(channel);
                let _ = reply.send(frame_id);
            }

            ShellCommand::DetachFrame { frame_id } => {
                if let Some(binding) = self.frames.remove(&frame_id) {
                    binding.pump.abort();
                    tracing::info!(%frame_id, "frame detached");
                }
            }

            ShellCommand::FrameInbound { frame_id, delivery } => {
                self.handle_inbound(frame_id, delivery).await;
            }

            ShellCommand::Shutdown => return true,
        }
        false
    }

    async fn sign_in(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<Principal, ShellError> {
        let prior = std::mem::replace(
            &mut self.state,
            SessionState::Authenticating,
        );
        match self.gateway.sign_in(email, password).await {
            Ok(session) => {
                let user = session.user.clone();
                self.persist(&session);
                self.state = SessionState::Authenticated(session);
                tracing::info!(%user, "signed in");
                Ok(user)
            }
            Err(e) => {
                // Failure leaves the session exactly as it was.
                self.state = prior;
                tracing::info!(error = %e, "sign-in failed");
                Err(ShellError::Identity(e))
            }
        }
    }

    async fn sign_up(
        &mut self,
        email: &str,
        password: &str,
        profile: NewUserProfile,
    ) -> Result<Principal, ShellError> {
        let prior = std::mem::replace(
            &mut self.state,
            SessionState::Authenticating,
        );
        match self.gateway.sign_up(email, password, profile).await {
            Ok(session) => {
                let user = session.user.clone();
                self.persist(&session);
                self.state = SessionState::Authenticated(session);
                tracing::info!(%user, "signed up");
                Ok(user)
            }
            Err(e) => {
                self.state = prior;
                tracing::info!(error = %e, "sign-up failed");
                Err(ShellError::Identity(e))
            }
        }
    }

    async fn sign_out(&mut self) {
        if let Err(e) = self.gateway.sign_out().await {
            // Locally the session is over regardless.
            tracing::warn!(error = %e, "provider sign-out failed");
        }
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "failed to clear session record");
        }
        self.state = SessionState::Anonymous;
        tracing::info!("signed out");
        // The gateway's SignedOut event queues the broadcast.
    }

    /// Refreshes the credential if a token demand finds it expired or
    /// within the leeway window. Single attempt; failure is terminal and
    /// takes the sign-out clearing path.
    async fn ensure_fresh_credential(&mut self) {
        let needs_refresh = match &self.state {
            SessionState::Authenticated(session) => session
                .credential
                .expires_within(self.config.refresh_leeway_secs, unix_now()),
            _ => false,
        };
        if !needs_refresh {
            return;
        }

        let session = match std::mem::replace(
            &mut self.state,
            SessionState::Anonymous,
        ) {
            SessionState::Authenticated(session) => session,
            other => {
                self.state = other;
                return;
            }
        };
        let refresh_token = session.credential.refresh_token.clone();
        self.state = SessionState::Refreshing(session);

        match self.gateway.refresh_session(&refresh_token).await {
            Ok(fresh) => {
                tracing::info!(user = %fresh.user, "credential refreshed");
                self.persist(&fresh);
                self.state = SessionState::Authenticated(fresh);
                // Refreshed event → AUTH_SIGNED_IN broadcast with fresh data.
            }
            Err(e) => {
                // Terminal: no retry, the user must re-authenticate.
                tracing::warn!(error = %e, "refresh failed, signing out");
                if let Err(e) = self.store.clear() {
                    tracing::warn!(error = %e, "failed to clear session record");
                }
                self.state = SessionState::Anonymous;
                self.broadcast(&CrossFrameMessage::AuthSignedOut).await;
            }
        }
    }

    fn persist(&self, session: &Session) {
        if let Err(e) = self.store.save(&SessionRecord::from(session)) {
            // The in-memory session stays live; only durability suffered.
            tracing::warn!(error = %e, "failed to persist session record");
        }
    }

    // -- Frame registry ----------------------------------------------------

    fn attach(&mut self, channel: Arc<C>) -> FrameId {
        let frame_id = channel.id();
        let pump = tokio::spawn(pump_frame(
            Arc::clone(&channel),
            frame_id,
            self.command_tx.clone(),
        ));
        tracing::info!(
            %frame_id,
            origin = %channel.peer_origin(),
            "frame attached"
        );
        self.frames.insert(frame_id, FrameBinding { channel, pump });
        frame_id
    }

    async fn handle_inbound(
        &mut self,
        frame_id: FrameId,
        delivery: Delivery,
    ) {
        let Some(binding) = self.frames.get(&frame_id) else {
            tracing::debug!(%frame_id, "delivery from unknown frame, dropping");
            return;
        };

        // Origin filter: the binding knows who it attached; a delivery
        // stamped with anything else is dropped before decoding.
        if delivery.origin != *binding.channel.peer_origin() {
            tracing::debug!(
                %frame_id,
                origin = %delivery.origin,
                "origin mismatch, dropping delivery"
            );
            return;
        }

        let msg: CrossFrameMessage =
            match self.codec.decode(&delivery.data) {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::debug!(%frame_id, error = %e, "undecodable delivery, dropping");
                    return;
                }
            };

        self.handle_frame_message(frame_id, msg).await;
    }

    async fn handle_frame_message(
        &mut self,
        frame_id: FrameId,
        msg: CrossFrameMessage,
    ) {
        match msg {
            // "What do you currently think the session is?" — answered
            // from the state as of right now, no side effects.
            CrossFrameMessage::RequestAuthState { source } => {
                tracing::debug!(%frame_id, %source, "auth state requested");
                let reply = match self.state.session() {
                    Some(session) => CrossFrameMessage::AuthSignedIn {
                        user: session.user.clone(),
                    },
                    None => CrossFrameMessage::AuthSignedOut,
                };
                self.post_to(frame_id, &reply).await;
            }

            // "Give me the session and a token" — the lazy-refresh
            // trigger. The reply is tagged with the requester's source
            // and posted origin-restricted.
            CrossFrameMessage::RequestAuthToken { source } => {
                tracing::debug!(%frame_id, %source, "auth token requested");
                self.ensure_fresh_credential().await;
                let grant = self.state.session().map(Session::grant);
                let reply =
                    CrossFrameMessage::AuthTokenResponse { source, grant };
                self.post_to(frame_id, &reply).await;
            }

            // Domain messages are relayed opaquely to every sibling.
            msg if msg.is_relayable() => {
                self.relay(frame_id, msg).await;
            }

            // An embedded frame has no write authority over the session;
            // shell-originated message types arriving from one are noise
            // at best, spoofing at worst.
            msg => {
                tracing::warn!(
                    %frame_id,
                    "dropping auth message from embedded frame: {msg:?}"
                );
            }
        }
    }

    /// Relays a domain message to every attached frame except the sender.
    async fn relay(&mut self, from: FrameId, msg: CrossFrameMessage) {
        let bytes = match self.codec.encode(&msg) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode relay");
                return;
            }
        };

        let mut dead = Vec::new();
        for (frame_id, binding) in &self.frames {
            if *frame_id == from {
                continue;
            }
            if let Err(e) =
                binding.channel.post(&bytes, TargetOrigin::Any).await
            {
                tracing::warn!(%frame_id, error = %e, "relay failed, skipping frame");
                dead.push(*frame_id);
            }
        }
        self.prune(dead);
    }

    // -- Outbound ----------------------------------------------------------

    /// Turns an in-process session change into a cross-frame broadcast.
    async fn announce(&mut self, change: SessionChange) {
        match change {
            SessionChange::SignedIn(session)
            | SessionChange::Refreshed(session) => {
                self.broadcast(&CrossFrameMessage::AuthSignedIn {
                    user: session.user,
                })
                .await;
            }
            SessionChange::SignedOut => {
                self.broadcast(&CrossFrameMessage::AuthSignedOut).await;
            }
        }
    }

    /// Posts a message to every attached frame (`TargetOrigin::Any` —
    /// broadcasts carry no token). Frames that have been torn down are
    /// logged, skipped, and pruned; a broadcast never fails as a whole.
    async fn broadcast(&mut self, msg: &CrossFrameMessage) {
        let bytes = match self.codec.encode(msg) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode broadcast");
                return;
            }
        };

        let mut dead = Vec::new();
        for (frame_id, binding) in &self.frames {
            if let Err(e) =
                binding.channel.post(&bytes, TargetOrigin::Any).await
            {
                tracing::warn!(%frame_id, error = %e, "broadcast failed, skipping frame");
                dead.push(*frame_id);
            }
        }
        self.prune(dead);
    }

    /// Posts a reply to one frame, origin-restricted to that frame.
    async fn post_to(&mut self, frame_id: FrameId, msg: &CrossFrameMessage) {
        let Some(binding) = self.frames.get(&frame_id) else {
            tracing::debug!(%frame_id, "reply target already detached");
            return;
        };
        let bytes = match self.codec.encode(msg) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode reply");
                return;
            }
        };
        let target =
            TargetOrigin::Exact(binding.channel.peer_origin().clone());
        if let Err(e) = binding.channel.post(&bytes, target).await {
            tracing::warn!(%frame_id, error = %e, "reply failed, detaching frame");
            self.prune(vec![frame_id]);
        }
    }

    fn prune(&mut self, dead: Vec<FrameId>) {
        for frame_id in dead {
            if let Some(binding) = self.frames.remove(&frame_id) {
                binding.pump.abort();
            }
        }
    }
}

/// Per-frame pump: forwards inbound deliveries into the coordinator's
/// mailbox until the channel closes, then requests its own detach.
async fn pump_frame<C: FrameChannel>(
    channel: Arc<C>,
    frame_id: FrameId,
    tx: mpsc::Sender<ShellCommand<C>>,
) {
    loop {
        match channel.recv().await {
            Ok(Some(delivery)) => {
                if tx
                    .send(ShellCommand::FrameInbound { frame_id, delivery })
                    .await
                    .is_err()
                {
                    // Coordinator is gone; nothing left to pump for.
                    break;
                }
            }
            Ok(None) => {
                tracing::debug!(%frame_id, "frame channel closed");
                let _ = tx.send(ShellCommand::DetachFrame { frame_id }).await;
                break;
            }
            Err(e) => {
                tracing::debug!(%frame_id, error = %e, "frame recv error");
                let _ = tx.send(ShellCommand::DetachFrame { frame_id }).await;
                break;
            }
        }
    }
}
