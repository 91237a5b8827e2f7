//! Pasha Checkout Gateway
//!
//! Axum-based backend bridging the static Pasha frontend to Stripe:
//! creates and retrieves hosted Checkout Sessions, hands out the
//! publishable key, and receives signed payment webhooks. Stripe owns
//! all durable state; this process keeps none.

mod config;
mod handlers;
mod state;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::GatewayConfig;
use crate::handlers::{checkout_session, create_checkout_session, public_key, stripe_webhook};
use crate::state::AppState;

const LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Build the gateway router: the four API routes, with the static
/// frontend served for everything else.
fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_dir = state.config.static_dir.clone();

    Router::new()
        .route("/create-checkout-session", post(create_checkout_session))
        .route("/checkout-session", get(checkout_session))
        .route("/public-key", get(public_key))
        .route("/webhook", post(stripe_webhook))
        .fallback_service(ServeDir::new(static_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment; the .env file is required
    dotenvy::dotenv().context("Failed to load .env")?;
    let config = GatewayConfig::from_env()?;

    tracing::info!("✓ Stripe configured");
    tracing::info!(static_dir = %config.static_dir, "✓ Serving static frontend");

    let app = router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(LISTEN_ADDR).await?;

    tracing::info!("🚀 Pasha checkout gateway running on http://{LISTEN_ADDR}");
    tracing::info!("Endpoints:");
    tracing::info!("  POST /create-checkout-session - Create a Checkout Session");
    tracing::info!("  GET  /checkout-session        - Fetch a Checkout Session");
    tracing::info!("  GET  /public-key              - Publishable key for the frontend");
    tracing::info!("  POST /webhook                 - Stripe event webhook");

    axum::serve(listener, app).await?;

    Ok(())
}
