//! Coffee storefront demo: one shell, three embedded micro-frontends.
//!
//! Runs the whole bridge in a single process — a catalog frame, a cart
//! frame, and an experiences frame attached to a shell backed by the
//! in-memory identity provider — and walks through the storefront's
//! day-one flows: startup state requests, sign-in broadcast, on-demand
//! token fetch, an add-to-cart relay, and sign-out.
//!
//! Run with `RUST_LOG=cortado=debug` to watch the coordinator work.

use std::time::Duration;

use cortado::prelude::*;
use cortado::LocalFrame;

const SHELL_ORIGIN: &str = "https://shop.example";

/// Mounts a micro-frontend and wires a logging view adapter to it.
/// The returned subscription must stay alive for the walk-through.
async fn attach(
    shell: &ShellHandle<InProcessChannel>,
    origin: &str,
    source: &str,
) -> (LocalFrame, Subscription) {
    let frame = LocalFrame::attach(
        shell,
        Origin::new(SHELL_ORIGIN),
        Origin::new(origin),
        FrameSource::new(source),
    )
    .await
    .expect("frame should attach");

    let label = source.to_string();
    let sub = frame.client.on_auth_state_change(move |event| match event {
        AuthEvent::SignedIn { user } => {
            tracing::info!(frame = %label, user = %user.name(), "signed in");
        }
        AuthEvent::SignedOut => {
            tracing::info!(frame = %label, "signed out");
        }
    });

    (frame, sub)
}

#[tokio::main]
async fn main() -> Result<(), CortadoError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // The hosted identity service, seeded with one barista.
    let provider = MemoryIdentityProvider::new();
    provider.register_user("barista@shop.example", "portafilter");

    let shell = ShellHandle::spawn(
        provider,
        MemoryCredentialStore::new(),
        ShellConfig::default(),
    );

    // Mount the three micro-frontends.
    let (catalog, _catalog_sub) =
        attach(&shell, "https://catalog.example", "react-catalog").await;
    let (cart, _cart_sub) =
        attach(&shell, "https://cart.example", "vue-cart").await;
    let (_experiences, _experiences_sub) = attach(
        &shell,
        "https://experiences.example",
        "angular-experiences",
    )
    .await;

    // Frames ask for state at startup; everyone is anonymous.
    catalog.client.request_auth_state().await?;
    tokio::time::sleep(Duration::from_millis(50)).await;
    tracing::info!(state = ?catalog.client.cached_state(), "catalog before sign-in");

    // The user signs in through the shell's own UI.
    let user = shell
        .sign_in("barista@shop.example", "portafilter")
        .await?;
    tracing::info!(user = %user.name(), "shell accepted sign-in");
    tokio::time::sleep(Duration::from_millis(50)).await;

    // The catalog needs a token to call the product API.
    let grant = catalog
        .client
        .get_current_user()
        .await
        .expect("session is live");
    tracing::info!(
        user = %grant.user.name(),
        token_len = grant.token.len(),
        "catalog fetched a bearer token"
    );

    // The cart hears about products added from the catalog.
    let cart_listener = cart.client.on_frame_message(|msg| {
        if let CrossFrameMessage::AddToCart {
            product_id,
            quantity,
            ..
        } = msg
        {
            tracing::info!(%product_id, quantity, "cart frame: item added");
        }
    });
    catalog
        .client
        .publish(CrossFrameMessage::AddToCart {
            source: FrameSource::new("react-catalog"),
            product_id: "arabica-250g".into(),
            quantity: 2,
        })
        .await?;
    tokio::time::sleep(Duration::from_millis(50)).await;
    cart_listener.unsubscribe();

    // Sign out: every frame flips to anonymous from one broadcast.
    shell.sign_out().await?;
    tokio::time::sleep(Duration::from_millis(50)).await;
    tracing::info!(
        state = ?cart.client.cached_state(),
        "cart after sign-out"
    );

    shell.shutdown().await?;
    Ok(())
}
