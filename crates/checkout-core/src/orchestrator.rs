//! # Authorization Orchestrator
//!
//! Calls the payment processor with a bounded, fixed-interval retry on the
//! transient rate-limit condition, and checks the result carries a client
//! secret before handing it back.

use crate::authorization::{AuthorizationRequest, AuthorizationResult, MIN_AMOUNT_MINOR_UNITS};
use crate::error::{PaymentError, PaymentResult};
use crate::processor::BoxedPaymentProcessor;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Retry budget for rate-limited processor calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Fixed wait between attempts
    pub backoff: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(1000);

    /// Upper bound on processor calls per authorization
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: Self::DEFAULT_MAX_RETRIES,
            backoff: Self::DEFAULT_BACKOFF,
        }
    }
}

/// Creates charge authorizations through an injected processor
#[derive(Clone)]
pub struct AuthorizationOrchestrator {
    processor: BoxedPaymentProcessor,
    policy: RetryPolicy,
}

impl AuthorizationOrchestrator {
    /// Create an orchestrator with the default retry policy
    pub fn new(processor: BoxedPaymentProcessor) -> Self {
        Self {
            processor,
            policy: RetryPolicy::default(),
        }
    }

    /// Builder: set the retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn provider_name(&self) -> &'static str {
        self.processor.provider_name()
    }

    /// Create a charge authorization and return its client secret.
    ///
    /// Rate-limited attempts are retried sequentially until the budget runs
    /// out, which turns the rate limit into a provider error. Every other
    /// error propagates on the attempt that produced it.
    #[instrument(
        skip(self, request),
        fields(request_id = %request.request_id, amount = request.amount_minor_units)
    )]
    pub async fn authorize(
        &self,
        request: &AuthorizationRequest,
    ) -> PaymentResult<AuthorizationResult> {
        if request.amount_minor_units < MIN_AMOUNT_MINOR_UNITS {
            return Err(PaymentError::AmountTooLow {
                amount_minor_units: request.amount_minor_units,
                minimum: MIN_AMOUNT_MINOR_UNITS,
            });
        }

        let provider = self.processor.provider_name();
        let mut retries_left = self.policy.max_retries;
        let mut attempts = 0;

        let intent = loop {
            attempts += 1;
            match self.processor.create_authorization(request).await {
                Ok(intent) => break intent,
                Err(err) if err.is_retryable() && retries_left > 0 => {
                    retries_left -= 1;
                    warn!(
                        attempt = attempts,
                        retries_left,
                        backoff_ms = self.policy.backoff.as_millis() as u64,
                        "{} rate limited, retrying",
                        provider
                    );
                    tokio::time::sleep(self.policy.backoff).await;
                }
                Err(err) if err.is_retryable() => {
                    return Err(PaymentError::ProviderError {
                        provider: provider.to_string(),
                        message: format!("rate limited after {} attempts", attempts),
                        caller_fault: false,
                    });
                }
                Err(err) => return Err(err),
            }
        };

        let client_secret = match intent.client_secret {
            Some(secret) if !secret.is_empty() => secret,
            _ => {
                return Err(PaymentError::MissingClientSecret {
                    provider: provider.to_string(),
                    intent_id: intent.id,
                })
            }
        };

        info!(
            intent_id = %intent.id,
            status = %intent.status,
            attempts,
            "authorization created"
        );

        Ok(AuthorizationResult {
            client_secret,
            intent_id: intent.id,
            amount_minor_units: request.amount_minor_units,
            attempts,
        })
    }
}
