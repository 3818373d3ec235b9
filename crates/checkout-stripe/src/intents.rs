//! # Stripe PaymentIntents
//!
//! Implementation of the Stripe PaymentIntents API.
//! One `POST /v1/payment_intents` per call; retries belong to the orchestrator.

use crate::config::StripeConfig;
use async_trait::async_trait;
use checkout_core::{
    AuthorizationRequest, PaymentError, PaymentProcessor, PaymentResult, ProcessorIntent,
};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, error, instrument, warn};

const PROVIDER: &str = "stripe";

/// Stripe PaymentIntents processor
///
/// Creates a PaymentIntent with automatic payment methods and returns its
/// client secret for confirmation with Stripe.js.
pub struct StripeIntentProcessor {
    config: StripeConfig,
    client: Client,
}

impl StripeIntentProcessor {
    /// Create a new processor; the HTTP client is built once and reused
    pub fn new(config: StripeConfig) -> PaymentResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PaymentError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> PaymentResult<Self> {
        let config = StripeConfig::from_env()?;
        Self::new(config)
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    /// Build form data for the Stripe API
    fn form_params(request: &AuthorizationRequest) -> Vec<(String, String)> {
        let mut form_params: Vec<(String, String)> = vec![
            ("amount".to_string(), request.amount_minor_units.to_string()),
            ("currency".to_string(), request.currency.to_string()),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
        ];

        for (key, value) in &request.metadata {
            form_params.push((format!("metadata[{}]", key), value.clone()));
        }

        form_params
    }
}

#[async_trait]
impl PaymentProcessor for StripeIntentProcessor {
    #[instrument(
        skip(self, request),
        fields(request_id = %request.request_id, amount = request.amount_minor_units)
    )]
    async fn create_authorization(
        &self,
        request: &AuthorizationRequest,
    ) -> PaymentResult<ProcessorIntent> {
        let url = format!("{}/v1/payment_intents", self.config.api_base_url);
        let form_params = Self::form_params(request);

        debug!(
            "Creating Stripe payment intent: amount={} {}, {} metadata keys",
            request.amount_minor_units,
            request.currency,
            request.metadata.len()
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .header("Idempotency-Key", &request.idempotency_key)
            .form(&form_params)
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            let err = classify_error(status, &body);
            if err.is_retryable() {
                warn!("Stripe rate limit: status={}", status);
            } else {
                error!("Stripe API error: status={}, body={}", status, body);
            }
            return Err(err);
        }

        let intent: StripePaymentIntentResponse = serde_json::from_str(&body).map_err(|e| {
            PaymentError::Serialization(format!("Failed to parse Stripe response: {}", e))
        })?;

        debug!("Created Stripe payment intent: id={}, status={}", intent.id, intent.status);

        Ok(ProcessorIntent {
            id: intent.id,
            client_secret: intent.client_secret,
            status: intent.status,
        })
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Map a non-2xx Stripe response to a payment error.
///
/// Rate limits are recognised by status 429, `code = rate_limit` or
/// `type = rate_limit_error`. Request and card errors on 400/402 are the
/// caller's fault; everything else is ours.
fn classify_error(status: StatusCode, body: &str) -> PaymentError {
    let parsed = serde_json::from_str::<StripeErrorResponse>(body)
        .ok()
        .map(|r| r.error);

    let code = parsed.as_ref().and_then(|e| e.code.as_deref());
    let error_type = parsed.as_ref().and_then(|e| e.error_type.as_deref());

    if status == StatusCode::TOO_MANY_REQUESTS
        || code == Some("rate_limit")
        || error_type == Some("rate_limit_error")
    {
        return PaymentError::RateLimited {
            provider: PROVIDER.to_string(),
        };
    }

    let caller_fault = matches!(status, StatusCode::BAD_REQUEST | StatusCode::PAYMENT_REQUIRED)
        && matches!(error_type, Some("invalid_request_error") | Some("card_error"));

    let message = parsed
        .and_then(|e| e.message)
        .unwrap_or_else(|| format!("HTTP {}", status));

    PaymentError::ProviderError {
        provider: PROVIDER.to_string(),
        message,
        caller_fault,
    }
}

// =============================================================================
// Stripe API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripePaymentIntentResponse {
    id: String,
    #[serde(default)]
    client_secret: Option<String>,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    #[serde(default)]
    message: Option<String>,
    #[serde(rename = "type", default)]
    error_type: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkout_core::{
        prepare_authorization, AuthorizationOrchestrator, CartLineItem, Decimal, RetryPolicy,
    };
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> AuthorizationRequest {
        let items = vec![CartLineItem::new("t1", "pro", 2, Decimal::new(1000, 2))];
        prepare_authorization("req-1", &items, Decimal::new(2000, 2), None).unwrap()
    }

    fn processor(server: &MockServer) -> StripeIntentProcessor {
        StripeIntentProcessor::new(StripeConfig::new("sk_test_abc123").with_api_base_url(server.uri()))
            .unwrap()
    }

    fn intent_body(client_secret: Option<&str>) -> serde_json::Value {
        json!({
            "id": "pi_123",
            "object": "payment_intent",
            "amount": 2000,
            "currency": "usd",
            "client_secret": client_secret,
            "status": "requires_payment_method"
        })
    }

    #[test]
    fn test_form_params() {
        let params = StripeIntentProcessor::form_params(&request());

        assert!(params.contains(&("amount".to_string(), "2000".to_string())));
        assert!(params.contains(&("currency".to_string(), "usd".to_string())));
        assert!(params.contains(&(
            "automatic_payment_methods[enabled]".to_string(),
            "true".to_string()
        )));
        assert!(params.contains(&("metadata[requestId]".to_string(), "req-1".to_string())));
        assert!(params.iter().any(|(k, _)| k == "metadata[orderItems]"));
    }

    #[test]
    fn test_classify_rate_limit() {
        let body = r#"{"error":{"type":"invalid_request_error","code":"rate_limit","message":"Too many requests"}}"#;
        assert!(classify_error(StatusCode::TOO_MANY_REQUESTS, body).is_retryable());
        assert!(classify_error(StatusCode::TOO_MANY_REQUESTS, "").is_retryable());
    }

    #[test]
    fn test_classify_caller_fault() {
        let body = r#"{"error":{"type":"invalid_request_error","message":"Amount must be at least $0.50 usd","param":"amount"}}"#;
        let err = classify_error(StatusCode::BAD_REQUEST, body);

        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("Amount must be at least"));
    }

    #[test]
    fn test_classify_server_fault() {
        let body = r#"{"error":{"type":"invalid_request_error","message":"Invalid API Key provided"}}"#;
        assert_eq!(classify_error(StatusCode::UNAUTHORIZED, body).status_code(), 500);

        let missing = r#"{"error":{"type":"invalid_request_error","code":"resource_missing","message":"No such payment_intent"}}"#;
        assert_eq!(classify_error(StatusCode::NOT_FOUND, missing).status_code(), 500);
        assert_eq!(
            classify_error(StatusCode::INTERNAL_SERVER_ERROR, "<html>").status_code(),
            500
        );
    }

    #[tokio::test]
    async fn test_create_authorization() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .and(header("authorization", "Bearer sk_test_abc123"))
            .and(header("idempotency-key", "cart-intent-req-1"))
            .and(body_string_contains("amount=2000"))
            .and(body_string_contains("currency=usd"))
            .and(body_string_contains("metadata%5BrequestId%5D=req-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(intent_body(Some("pi_123_secret_abc"))))
            .expect(1)
            .mount(&server)
            .await;

        let intent = processor(&server)
            .create_authorization(&request())
            .await
            .unwrap();

        assert_eq!(intent.id, "pi_123");
        assert_eq!(intent.client_secret.as_deref(), Some("pi_123_secret_abc"));
        assert_eq!(intent.status, "requires_payment_method");
    }

    #[tokio::test]
    async fn test_rate_limit_exhausts_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .and(header("idempotency-key", "cart-intent-req-1"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {"type": "invalid_request_error", "code": "rate_limit", "message": "Too many requests"}
            })))
            .expect(4)
            .mount(&server)
            .await;

        let orchestrator = AuthorizationOrchestrator::new(Arc::new(processor(&server))).with_policy(
            RetryPolicy {
                max_retries: 3,
                backoff: Duration::from_millis(5),
            },
        );

        let err = orchestrator.authorize(&request()).await.unwrap_err();
        assert!(matches!(err, PaymentError::ProviderError { .. }));
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn test_card_error_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .respond_with(ResponseTemplate::new(402).set_body_json(json!({
                "error": {"type": "card_error", "code": "card_declined", "message": "Your card was declined."}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let orchestrator = AuthorizationOrchestrator::new(Arc::new(processor(&server)));

        let err = orchestrator.authorize(&request()).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.client_message(), "Provider error [stripe]: Your card was declined.");
    }

    #[tokio::test]
    async fn test_missing_client_secret() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(intent_body(None)))
            .expect(1)
            .mount(&server)
            .await;

        let orchestrator = AuthorizationOrchestrator::new(Arc::new(processor(&server)));

        let err = orchestrator.authorize(&request()).await.unwrap_err();
        assert!(matches!(err, PaymentError::MissingClientSecret { .. }));
    }

    #[tokio::test]
    async fn test_malformed_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = processor(&server)
            .create_authorization(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Serialization(_)));
    }
}
