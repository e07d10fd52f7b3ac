//! End-to-end tests for the full auth bridge: coordinator, in-process
//! frames, embedded clients, and the message protocol between them.
//!
//! These are the system-level guarantees the storefront leans on —
//! single-writer session state, eventual consistency of broadcasts,
//! bounded timeouts, mandatory origin filtering, and cache coherence
//! after sign-out.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use cortado::prelude::*;
use cortado::LocalFrame;

const SHELL: &str = "https://shop.example";

fn shell_origin() -> Origin {
    Origin::new(SHELL)
}

fn provider() -> Arc<MemoryIdentityProvider> {
    let p = MemoryIdentityProvider::new();
    p.register_user("a@b.com", "ristretto");
    Arc::new(p)
}

fn spawn_shell(
    provider: Arc<MemoryIdentityProvider>,
) -> ShellHandle<InProcessChannel> {
    ShellHandle::spawn(
        provider,
        MemoryCredentialStore::new(),
        ShellConfig::default(),
    )
}

async fn catalog_frame(
    shell: &ShellHandle<InProcessChannel>,
) -> LocalFrame {
    LocalFrame::attach(
        shell,
        shell_origin(),
        Origin::new("https://catalog.example"),
        FrameSource::new("react-catalog"),
    )
    .await
    .expect("attach should succeed")
}

async fn cart_frame(shell: &ShellHandle<InProcessChannel>) -> LocalFrame {
    LocalFrame::attach(
        shell,
        shell_origin(),
        Origin::new("https://cart.example"),
        FrameSource::new("vue-cart"),
    )
    .await
    .expect("attach should succeed")
}

/// Settle time for one broadcast to cross the in-process boundary.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

// =========================================================================
// Eventual consistency: broadcasts reach every live subscriber
// =========================================================================

#[tokio::test]
async fn test_sign_in_notifies_every_live_subscribed_client() {
    let shell = spawn_shell(provider());
    let catalog = catalog_frame(&shell).await;
    let cart = cart_frame(&shell).await;

    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let _sub_catalog = {
        let seen = Arc::clone(&seen);
        catalog.client.on_auth_state_change(move |event| {
            if let AuthEvent::SignedIn { user } = event {
                seen.lock().unwrap().push(user.email.clone());
            }
        })
    };
    let _sub_cart = {
        let seen = Arc::clone(&seen);
        cart.client.on_auth_state_change(move |event| {
            if let AuthEvent::SignedIn { user } = event {
                seen.lock().unwrap().push(user.email.clone());
            }
        })
    };

    shell.sign_in("a@b.com", "ristretto").await.unwrap();
    settle().await;

    let seen = seen.lock().unwrap();
    assert_eq!(
        seen.as_slice(),
        ["a@b.com", "a@b.com"],
        "both live, subscribed frames hear the matching principal"
    );
}

#[tokio::test]
async fn test_sign_out_notifies_and_clears_every_client() {
    let shell = spawn_shell(provider());
    let catalog = catalog_frame(&shell).await;
    let cart = cart_frame(&shell).await;

    shell.sign_in("a@b.com", "ristretto").await.unwrap();
    settle().await;
    assert!(catalog.client.get_current_user().await.is_some());

    shell.sign_out().await.unwrap();
    settle().await;

    // Property: a client that relies on its cache must reflect "no
    // session", not a stale principal.
    assert_eq!(catalog.client.get_current_user().await, None);
    assert_eq!(cart.client.get_current_user().await, None);
    assert_eq!(catalog.client.cached_state(), CachedAuthState::SignedOut);
}

// =========================================================================
// Round trip: broadcast → on-demand token fetch
// =========================================================================

#[tokio::test]
async fn test_round_trip_grant_matches_shell_session() {
    let shell = spawn_shell(provider());
    let catalog = catalog_frame(&shell).await;

    shell.sign_in("a@b.com", "ristretto").await.unwrap();
    settle().await;

    let grant = catalog
        .client
        .get_current_user()
        .await
        .expect("session is live");

    // Principal shape, including the derived display name.
    assert_eq!(grant.user.email, "a@b.com");
    assert_eq!(grant.user.name(), "a");
    // The token is the same one the shell would hand its own services.
    let shell_token = shell.access_token().await.unwrap();
    assert_eq!(Some(grant.token), shell_token);
}

#[tokio::test]
async fn test_client_attached_after_sign_in_catches_up_on_request() {
    // A frame that loads late missed the broadcast; its startup
    // request-path still converges on the truth.
    let shell = spawn_shell(provider());
    shell.sign_in("a@b.com", "ristretto").await.unwrap();

    let late = cart_frame(&shell).await;
    let grant = late
        .client
        .get_current_user()
        .await
        .expect("late frame still learns the session");
    assert_eq!(grant.user.email, "a@b.com");
}

// =========================================================================
// Timeout: resolves, never hangs
// =========================================================================

#[tokio::test]
async fn test_get_current_user_with_no_shell_resolves_in_window() {
    // A frame whose shell end was never attached (and is gone): no
    // responder exists at all.
    let (shell_end, frame_end) =
        frame_pair(shell_origin(), Origin::new("https://catalog.example"));
    drop(shell_end);

    let client = EmbeddedAuthClient::spawn(
        Arc::new(frame_end),
        ClientConfig::new(
            FrameSource::new("react-catalog"),
            shell_origin(),
        )
        .with_request_timeout(Duration::from_millis(150)),
    );

    let started = Instant::now();
    let result = client.get_current_user().await;

    assert_eq!(result, None, "no session, not an error");
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "resolved within the window, no dangling wait"
    );
}

// =========================================================================
// Origin filtering through the stack
// =========================================================================

#[tokio::test]
async fn test_client_expecting_other_origin_hears_nothing() {
    // The client's configured shell origin doesn't match the channel's
    // actual peer: the mandatory filter drops everything, and the
    // client's own posts never arrive either (target mismatch). The
    // frame just looks anonymous — no errors, no listener fires.
    let shell = spawn_shell(provider());

    let misconfigured = ClientConfig::new(
        FrameSource::new("react-catalog"),
        Origin::new("https://other.example"),
    )
    .with_request_timeout(Duration::from_millis(150));
    let frame = LocalFrame::attach_with_config(
        &shell,
        shell_origin(),
        Origin::new("https://catalog.example"),
        misconfigured,
    )
    .await
    .expect("attach should succeed");

    let fired = Arc::new(AtomicUsize::new(0));
    let _sub = {
        let fired = Arc::clone(&fired);
        frame.client.on_auth_state_change(move |_| {
            fired.fetch_add(1, Ordering::SeqCst);
        })
    };

    shell.sign_in("a@b.com", "ristretto").await.unwrap();
    settle().await;

    assert_eq!(fired.load(Ordering::SeqCst), 0, "no listener fires");
    assert_eq!(frame.client.cached_state(), CachedAuthState::Unknown);
    assert_eq!(frame.client.get_current_user().await, None);
}

// =========================================================================
// At-most-one-writer
// =========================================================================

#[tokio::test]
async fn test_racing_token_requests_only_ever_see_shell_states() {
    // A token request racing a sign-in may see anonymous or the new
    // session — both are states the shell produced. It must never see
    // anything synthesized (wrong user, empty token).
    let shell = spawn_shell(provider());
    let catalog = catalog_frame(&shell).await;

    let race = tokio::join!(
        catalog.client.get_current_user(),
        shell.sign_in("a@b.com", "ristretto"),
    );

    match race.0 {
        None => {} // transiently anonymous; the broadcast corrects it
        Some(grant) => {
            assert_eq!(grant.user.email, "a@b.com");
            assert!(!grant.token.is_empty());
        }
    }
    race.1.expect("sign-in itself succeeds");

    // Convergence: after the dust settles, the client agrees with the
    // shell.
    settle().await;
    let grant = catalog.client.get_current_user().await;
    assert_eq!(
        grant.map(|g| g.user.email),
        Some("a@b.com".to_string())
    );
}

// =========================================================================
// Domain relay between sibling clients
// =========================================================================

#[tokio::test]
async fn test_cart_event_relays_to_sibling_not_sender() {
    let shell = spawn_shell(provider());
    let catalog = catalog_frame(&shell).await;
    let cart = cart_frame(&shell).await;

    let cart_heard = Arc::new(AtomicUsize::new(0));
    let _cart_sub = {
        let heard = Arc::clone(&cart_heard);
        cart.client.on_frame_message(move |msg| {
            if let CrossFrameMessage::AddToCart {
                product_id,
                quantity,
                ..
            } = msg
            {
                assert_eq!(product_id, "arabica-250g");
                assert_eq!(*quantity, 2);
                heard.fetch_add(1, Ordering::SeqCst);
            }
        })
    };
    let catalog_heard = Arc::new(AtomicUsize::new(0));
    let _catalog_sub = {
        let heard = Arc::clone(&catalog_heard);
        catalog.client.on_frame_message(move |_| {
            heard.fetch_add(1, Ordering::SeqCst);
        })
    };

    catalog
        .client
        .publish(CrossFrameMessage::AddToCart {
            source: FrameSource::new("react-catalog"),
            product_id: "arabica-250g".into(),
            quantity: 2,
        })
        .await
        .expect("publish should succeed");
    settle().await;

    assert_eq!(cart_heard.load(Ordering::SeqCst), 1, "sibling hears it");
    assert_eq!(
        catalog_heard.load(Ordering::SeqCst),
        0,
        "sender does not hear its own relay"
    );
}

// =========================================================================
// Frame lifecycle
// =========================================================================

#[tokio::test]
async fn test_detached_frame_misses_later_broadcasts() {
    let shell = spawn_shell(provider());
    let catalog = catalog_frame(&shell).await;
    let cart = cart_frame(&shell).await;

    catalog.detach(&shell).await.unwrap();
    settle().await;

    shell.sign_in("a@b.com", "ristretto").await.unwrap();
    settle().await;

    assert_eq!(
        catalog.client.cached_state(),
        CachedAuthState::Unknown,
        "detached frame heard nothing"
    );
    assert!(matches!(
        cart.client.cached_state(),
        CachedAuthState::SignedIn { .. }
    ));
}

#[tokio::test]
async fn test_dropped_frame_does_not_break_the_shell() {
    let shell = spawn_shell(provider());
    let catalog = catalog_frame(&shell).await;
    {
        let _doomed = cart_frame(&shell).await;
        // Dropped here: the client (and its channel end) are torn down
        // without telling the shell, as a hard navigation would.
    }
    settle().await;

    shell.sign_in("a@b.com", "ristretto").await.unwrap();
    settle().await;

    // The surviving frame still gets everything.
    assert!(matches!(
        catalog.client.cached_state(),
        CachedAuthState::SignedIn { .. }
    ));
}
