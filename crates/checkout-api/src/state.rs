//! # Application State
//!
//! Shared state for the Axum application.
//! Holds the configured orchestrator (built once per process), the optional
//! price catalog and the application config.

use anyhow::Context;
use checkout_core::{
    AuthorizationOrchestrator, BoxedPaymentProcessor, PaymentError, PaymentResult, PriceCatalog,
};
use checkout_stripe::StripeIntentProcessor;
use std::sync::Arc;
use std::time::Duration;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Upper bound for the authorization phase of one request
    pub request_deadline: Duration,
    /// Location of the price catalog
    pub catalog_path: String,
    /// Reject items whose unit price differs from the catalog
    pub enforce_catalog_prices: bool,
    /// Log output format
    pub log_format: LogFormat,
}

impl AppConfig {
    pub const DEFAULT_REQUEST_DEADLINE: Duration = Duration::from_millis(15_000);

    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            request_deadline: lookup("REQUEST_DEADLINE_MS")
                .and_then(|ms| ms.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(Self::DEFAULT_REQUEST_DEADLINE),
            catalog_path: lookup("CATALOG_PATH")
                .unwrap_or_else(|| "config/catalog.toml".to_string()),
            enforce_catalog_prices: lookup("ENFORCE_CATALOG_PRICES")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            log_format: match lookup("LOG_FORMAT").as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid socket address {}:{}", self.host, self.port))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Authorization orchestrator, absent when the processor is not configured
    orchestrator: Option<AuthorizationOrchestrator>,
    /// Why the processor could not be configured
    processor_error: Option<String>,
    /// Price catalog, present only when prices are enforced
    pub catalog: Option<Arc<PriceCatalog>>,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create a new AppState with the Stripe processor.
    ///
    /// A missing or invalid Stripe key does not stop the service: it is
    /// logged here and reported on every payment request.
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let catalog = load_price_catalog(&config)?;

        let state = match StripeIntentProcessor::from_env() {
            Ok(processor) => Self::with_processor(config, Arc::new(processor)),
            Err(e) => {
                tracing::error!("Payment processor unavailable: {}", e);
                Self::without_processor(config, e.to_string())
            }
        };

        Ok(state.with_catalog(catalog))
    }

    /// Create state around an already configured processor
    pub fn with_processor(config: AppConfig, processor: BoxedPaymentProcessor) -> Self {
        Self::with_orchestrator(config, AuthorizationOrchestrator::new(processor))
    }

    /// Create state around a fully built orchestrator
    pub fn with_orchestrator(config: AppConfig, orchestrator: AuthorizationOrchestrator) -> Self {
        Self {
            orchestrator: Some(orchestrator),
            processor_error: None,
            catalog: None,
            config,
        }
    }

    /// Create state whose payment requests all fail with a configuration error
    pub fn without_processor(config: AppConfig, reason: impl Into<String>) -> Self {
        Self {
            orchestrator: None,
            processor_error: Some(reason.into()),
            catalog: None,
            config,
        }
    }

    /// Builder: set the price catalog
    pub fn with_catalog(mut self, catalog: Option<PriceCatalog>) -> Self {
        self.catalog = catalog.map(Arc::new);
        self
    }

    /// Get the orchestrator, or the configuration error that replaced it
    pub fn orchestrator(&self) -> PaymentResult<&AuthorizationOrchestrator> {
        self.orchestrator.as_ref().ok_or_else(|| {
            PaymentError::Configuration(
                self.processor_error
                    .clone()
                    .unwrap_or_else(|| "payment processor not configured".to_string()),
            )
        })
    }

    /// Name of the configured payment provider
    pub fn provider_name(&self) -> Option<&'static str> {
        self.orchestrator.as_ref().map(|o| o.provider_name())
    }
}

/// Load the price catalog when enforcement is on
fn load_price_catalog(config: &AppConfig) -> anyhow::Result<Option<PriceCatalog>> {
    if !config.enforce_catalog_prices {
        tracing::warn!("Catalog price enforcement disabled, trusting submitted unit prices");
        return Ok(None);
    }

    let content = std::fs::read_to_string(&config.catalog_path)
        .with_context(|| format!("Failed to read price catalog {}", config.catalog_path))?;
    let catalog = PriceCatalog::from_toml(&content)
        .with_context(|| format!("Failed to parse {}", config.catalog_path))?;

    tracing::info!(
        "Loaded {} catalog entries from {}",
        catalog.len(),
        config.catalog_path
    );
    Ok(Some(catalog))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.request_deadline, Duration::from_secs(15));
        assert!(!config.enforce_catalog_prices);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_app_config_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PORT", "3000"),
            ("REQUEST_DEADLINE_MS", "2500"),
            ("ENFORCE_CATALOG_PRICES", "TRUE"),
            ("LOG_FORMAT", "json"),
            ("ENVIRONMENT", "production"),
        ]));

        assert_eq!(config.port, 3000);
        assert_eq!(config.request_deadline, Duration::from_millis(2500));
        assert!(config.enforce_catalog_prices);
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.is_production());
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            ..AppConfig::default()
        };

        let addr = config.socket_addr().unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:3000");

        let bad = AppConfig {
            host: "not a host".to_string(),
            ..AppConfig::default()
        };
        assert!(bad.socket_addr().is_err());
    }

    #[test]
    fn test_missing_processor_is_configuration_error() {
        let state = AppState::without_processor(AppConfig::default(), "STRIPE_SECRET_KEY not set");

        let err = state.orchestrator().err().unwrap();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.code(), "configuration_error");
        assert!(state.provider_name().is_none());
    }

    #[test]
    fn test_catalog_required_when_enforced() {
        let config = AppConfig {
            enforce_catalog_prices: true,
            catalog_path: "does/not/exist.toml".to_string(),
            ..AppConfig::default()
        };
        assert!(load_price_catalog(&config).is_err());
        assert!(load_price_catalog(&AppConfig::default()).unwrap().is_none());
    }
}
