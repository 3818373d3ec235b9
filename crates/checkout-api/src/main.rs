//! # Cart-Intent RS
//!
//! Payment-intent service: validates carts and creates Stripe PaymentIntents.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export STRIPE_SECRET_KEY=sk_test_...
//!
//! # Run the server
//! cart-intent
//! ```

use checkout_api::{routes, AppConfig, AppState, LogFormat};
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load config first, the log format depends on it
    let config = AppConfig::from_env();
    init_tracing(config.log_format);

    // Initialize application state
    let state = AppState::from_config(config)?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!(
        "Request deadline: {}ms",
        state.config.request_deadline.as_millis()
    );
    match state.provider_name() {
        Some(provider) => info!("Payment processor: {}", provider),
        None => warn!("Payment processor not configured, payment requests will fail"),
    }

    // Create router
    let app = routes::create_router(state);

    info!("Cart-Intent starting on http://{}", addr);

    if !is_prod {
        info!("Health: http://{}/health", addr);
        info!("Payment intents: POST http://{}/api/v1/payment-intents", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init(),
    }
}
