//! # Payment Error Types
//!
//! Typed error handling for the cart-intent payment engine.
//! All payment operations return `Result<T, PaymentError>`.
//!
//! Classification is structural: `status_code()` and `code()` are derived from
//! the variant, never from the rendered message.

use crate::cart::CartError;
use thiserror::Error;

/// Core error type for all payment operations
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Body could not be decoded or lacks required top-level fields
    #[error("Invalid request: {0}")]
    MalformedRequest(String),

    /// Cart failed structural checks or its total does not add up
    #[error(transparent)]
    InvalidCart(#[from] CartError),

    /// Amount below the processor minimum
    #[error("Invalid amount: {amount_minor_units} minor units is below the minimum of {minimum}")]
    AmountTooLow {
        amount_minor_units: i64,
        minimum: i64,
    },

    /// Amount above the processor maximum
    #[error("Invalid amount: {amount_minor_units} minor units exceeds the maximum of {maximum}")]
    AmountTooHigh {
        amount_minor_units: i64,
        maximum: i64,
    },

    /// Transient rate-limit condition reported by the processor
    #[error("Rate limited by {provider}")]
    RateLimited { provider: String },

    /// Payment provider API error
    #[error("Provider error [{provider}]: {message}")]
    ProviderError {
        provider: String,
        message: String,
        /// The provider attributes the failure to the caller's input
        caller_fault: bool,
    },

    /// Provider reported success but returned no usable client secret
    #[error("Provider [{provider}] returned intent {intent_id} without a client secret")]
    MissingClientSecret { provider: String, intent_id: String },

    /// Network/HTTP error communicating with provider
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Authorization did not finish within the request deadline
    #[error("Authorization exceeded the request deadline of {deadline_ms}ms")]
    DeadlineExceeded { deadline_ms: u64 },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PaymentError {
    /// Returns true if this error is retryable.
    ///
    /// Only the processor's rate-limit condition qualifies.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PaymentError::RateLimited { .. })
    }

    /// Returns true if the client caused this error and must change its input
    pub fn is_client_error(&self) -> bool {
        self.status_code() == 400
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            PaymentError::Configuration(_) => 500,
            PaymentError::MalformedRequest(_) => 400,
            PaymentError::InvalidCart(_) => 400,
            PaymentError::AmountTooLow { .. } => 400,
            PaymentError::AmountTooHigh { .. } => 400,
            PaymentError::RateLimited { .. } => 500,
            PaymentError::ProviderError { caller_fault, .. } => {
                if *caller_fault {
                    400
                } else {
                    500
                }
            }
            PaymentError::MissingClientSecret { .. } => 500,
            PaymentError::NetworkError(_) => 500,
            PaymentError::DeadlineExceeded { .. } => 504,
            PaymentError::Serialization(_) => 500,
        }
    }

    /// Stable machine-readable category for API clients
    pub fn code(&self) -> &'static str {
        match self {
            PaymentError::Configuration(_) => "configuration_error",
            PaymentError::MalformedRequest(_) => "malformed_request",
            PaymentError::InvalidCart(err) => err.code(),
            PaymentError::AmountTooLow { .. } => "amount_too_low",
            PaymentError::AmountTooHigh { .. } => "amount_too_high",
            PaymentError::RateLimited { .. } => "rate_limited",
            PaymentError::ProviderError { .. } | PaymentError::MissingClientSecret { .. } => {
                "processor_error"
            }
            PaymentError::NetworkError(_) => "network_error",
            PaymentError::DeadlineExceeded { .. } => "deadline_exceeded",
            PaymentError::Serialization(_) => "internal_error",
        }
    }

    /// Message safe to hand to the client.
    ///
    /// Client-class errors explain what to fix; server-class errors get a
    /// fixed message so provider payloads and config details stay in the logs.
    pub fn client_message(&self) -> String {
        if self.is_client_error() {
            return self.to_string();
        }
        match self {
            PaymentError::Configuration(_) => "Payment service is not configured".to_string(),
            PaymentError::DeadlineExceeded { .. } => {
                "Payment initialization timed out".to_string()
            }
            _ => "Payment initialization failed".to_string(),
        }
    }
}

/// Result type alias for payment operations
pub type PaymentResult<T> = Result<T, PaymentError>;
