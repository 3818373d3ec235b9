//! # Payment Processor Trait
//!
//! Seam between the orchestrator and a payment provider.
//! Implementations: Stripe PaymentIntents (`checkout-stripe`), test stubs.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 PaymentProcessor (trait)                    │
//! │  ├── create_authorization()                                 │
//! │  └── provider_name()                                        │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!          ┌─────────────────┴─────────────────┐
//!          │                                   │
//!  ┌───────┴────────┐                  ┌───────┴───────┐
//!  │ StripeIntent   │                  │  test stubs   │
//!  │   Processor    │                  │               │
//!  └────────────────┘                  └───────────────┘
//! ```

use crate::authorization::AuthorizationRequest;
use crate::error::PaymentResult;
use async_trait::async_trait;
use std::sync::Arc;

/// Charge authorization as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorIntent {
    /// Provider's id (e.g., "pi_...")
    pub id: String,

    /// Secret the client confirms the charge with; providers may omit it
    pub client_secret: Option<String>,

    /// Provider status (e.g., "requires_payment_method")
    pub status: String,
}

/// Core trait for payment provider implementations.
///
/// Implementations make exactly one provider call per invocation and report
/// a rate-limit response as [`crate::PaymentError::RateLimited`]; retrying is
/// the orchestrator's job.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Create a charge authorization for `request`.
    async fn create_authorization(
        &self,
        request: &AuthorizationRequest,
    ) -> PaymentResult<ProcessorIntent>;

    /// Get the provider name (for logging and errors).
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a shared payment processor (dynamic dispatch)
pub type BoxedPaymentProcessor = Arc<dyn PaymentProcessor>;
