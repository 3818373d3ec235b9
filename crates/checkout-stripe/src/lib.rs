//! # checkout-stripe
//!
//! Stripe payment processor for cart-intent-rs.
//!
//! [`StripeIntentProcessor`] creates PaymentIntents with automatic payment
//! methods and hands the client secret back to the orchestrator. The client
//! then confirms the payment with Stripe.js.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use checkout_core::AuthorizationOrchestrator;
//! use checkout_stripe::StripeIntentProcessor;
//! use std::sync::Arc;
//!
//! // Build the processor once at startup
//! let processor = StripeIntentProcessor::from_env()?;
//! let orchestrator = AuthorizationOrchestrator::new(Arc::new(processor));
//!
//! // Per request
//! let result = orchestrator.authorize(&request).await?;
//! ```

pub mod config;
pub mod intents;

// Re-exports
pub use config::StripeConfig;
pub use intents::StripeIntentProcessor;
