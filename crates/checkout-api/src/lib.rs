//! # checkout-api
//!
//! HTTP API layer for cart-intent-rs.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - The payment-intent endpoint: cart re-validation, amount computation,
//!   authorization with retry, typed error responses
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/api/v1/payment-intents` | Create payment intent |
//! | POST | `/api/create-payment-intent` | Create payment intent (legacy path) |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState, LogFormat};
