//! # checkout-core
//!
//! Core types and traits for the cart-intent payment engine.
//!
//! This crate provides:
//! - `validate_cart` and the cart types for server-side cart re-validation
//! - `AuthorizationRequest` for minor-unit amounts and processor metadata
//! - `PriceCatalog` for optional authoritative pricing
//! - `PaymentProcessor` trait for implementing payment providers
//! - `AuthorizationOrchestrator` for rate-limit aware authorization
//! - `PaymentError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use checkout_core::{prepare_authorization, AuthorizationOrchestrator, CartSubmission};
//!
//! let (items, amount) = CartSubmission::from_slice(body)?.into_parts()?;
//! let request = prepare_authorization(&request_id, &items, amount, None)?;
//!
//! let orchestrator = AuthorizationOrchestrator::new(processor);
//! let result = orchestrator.authorize(&request).await?;
//!
//! // Hand result.client_secret to the client
//! ```

pub mod authorization;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod orchestrator;
pub mod processor;

// Re-exports for convenience
pub use authorization::{
    checked_amount, prepare_authorization, to_minor_units, AuthorizationRequest,
    AuthorizationResult, CHARGE_CURRENCY, MAX_AMOUNT_MINOR_UNITS, MIN_AMOUNT_MINOR_UNITS,
};
pub use cart::{
    validate_cart, CartError, CartLineItem, CartSubmission, ValidatedCart, ValidatedLineItem,
};
pub use catalog::{CatalogEntry, PriceCatalog};
pub use error::{PaymentError, PaymentResult};
pub use orchestrator::{AuthorizationOrchestrator, RetryPolicy};
pub use processor::{BoxedPaymentProcessor, PaymentProcessor, ProcessorIntent};

pub use rust_decimal::Decimal;
