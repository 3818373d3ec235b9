//! # Request Handlers
//!
//! Axum request handlers for the payment API.
//!
//! A payment-intent request moves through
//! `Received → Parsed → CartValidated → AmountComputed → AuthorizationRequested`
//! and ends in a client secret or a typed error. The request id generated on
//! receipt is logged with every step and returned with every response.

use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{header::HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use checkout_core::{
    prepare_authorization, AuthorizationResult, CartSubmission, PaymentError, PaymentResult,
};
use serde::Serialize;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Response header carrying the correlation id
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

// =============================================================================
// Request/Response Types
// =============================================================================

/// Create payment intent response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    /// Secret the client confirms the payment with
    pub client_secret: String,
    /// Charged amount in minor units
    pub amount: i64,
    pub request_id: String,
}

/// Error response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub request_id: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            request_id: request_id.into(),
        }
    }
}

fn payment_error_to_response(request_id: &str, err: PaymentError) -> Response {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = ErrorResponse::new(err.client_message(), err.code(), request_id);
    (status, [(REQUEST_ID_HEADER, request_id.to_string())], Json(body)).into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "cart-intent",
        "version": env!("CARGO_PKG_VERSION"),
        "processor": state.provider_name(),
    }))
}

/// Create a payment intent for a submitted cart
#[instrument(skip(state, body), fields(request_id = tracing::field::Empty))]
pub async fn create_payment_intent(State(state): State<AppState>, body: Bytes) -> Response {
    let request_id = Uuid::new_v4().to_string();
    tracing::Span::current().record("request_id", request_id.as_str());

    match initiate_payment(&state, &request_id, &body).await {
        Ok(result) => {
            info!(
                intent_id = %result.intent_id,
                amount = result.amount_minor_units,
                attempts = result.attempts,
                "Payment intent created"
            );
            let response = PaymentIntentResponse {
                client_secret: result.client_secret,
                amount: result.amount_minor_units,
                request_id: request_id.clone(),
            };
            (StatusCode::OK, [(REQUEST_ID_HEADER, request_id)], Json(response)).into_response()
        }
        Err(err) => {
            if err.is_client_error() {
                warn!(code = err.code(), "Payment initialization rejected: {}", err);
            } else {
                error!(code = err.code(), "Payment initialization error: {}", err);
            }
            payment_error_to_response(&request_id, err)
        }
    }
}

/// Drive one request from the raw body to an authorization
async fn initiate_payment(
    state: &AppState,
    request_id: &str,
    body: &[u8],
) -> PaymentResult<AuthorizationResult> {
    // Received: nothing is processed without a configured processor
    let orchestrator = state.orchestrator()?;

    // Parsed
    let (items, amount) = CartSubmission::from_slice(body)?.into_parts()?;

    // CartValidated, AmountComputed
    let request = prepare_authorization(request_id, &items, amount, state.catalog.as_deref())?;

    // AuthorizationRequested
    let deadline = state.config.request_deadline;
    tokio::time::timeout(deadline, orchestrator.authorize(&request))
        .await
        .map_err(|_| PaymentError::DeadlineExceeded {
            deadline_ms: deadline.as_millis() as u64,
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkout_core::CartError;

    #[test]
    fn test_error_response() {
        let err = ErrorResponse::new("Test error", "malformed_request", "req-1");
        assert_eq!(err.error, "Test error");
        assert_eq!(err.request_id, "req-1");

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["requestId"], "req-1");
    }

    #[test]
    fn test_payment_error_conversion() {
        let response = payment_error_to_response("req-1", PaymentError::InvalidCart(CartError::Empty));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-1");

        let response = payment_error_to_response(
            "req-2",
            PaymentError::Configuration("STRIPE_SECRET_KEY not set".into()),
        );
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
