//! # Authorization Requests
//!
//! Turns a validated cart into the charge request sent to the processor:
//! integral minor-unit amount, fixed currency, idempotency key and the
//! metadata snapshot the processor keeps for reconciliation.

use crate::cart::{validate_cart, CartError, CartLineItem, ValidatedCart, ValidatedLineItem};
use crate::catalog::PriceCatalog;
use crate::error::{PaymentError, PaymentResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// ISO 4217 code of every charge
pub const CHARGE_CURRENCY: &str = "usd";

/// Processor minimum charge ($0.50)
pub const MIN_AMOUNT_MINOR_UNITS: i64 = 50;

/// Processor maximum charge ($999,999.99)
pub const MAX_AMOUNT_MINOR_UNITS: i64 = 99_999_999;

/// Processor limit on a single metadata value
pub const METADATA_VALUE_MAX_CHARS: usize = 500;

/// Maximum number of metadata values the order snapshot may occupy
pub const MAX_SNAPSHOT_PARTS: usize = 40;

/// Convert a major-unit total to minor units, rounding half away from zero.
///
/// Returns `None` if the result does not fit in an `i64`.
pub fn to_minor_units(total: Decimal) -> Option<i64> {
    total
        .checked_mul(Decimal::from(100))?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Convert a claimed total to minor units and enforce the processor bounds
pub fn checked_amount(total: Decimal) -> PaymentResult<i64> {
    let amount = to_minor_units(total).ok_or(PaymentError::AmountTooHigh {
        amount_minor_units: i64::MAX,
        maximum: MAX_AMOUNT_MINOR_UNITS,
    })?;

    if amount < MIN_AMOUNT_MINOR_UNITS {
        return Err(PaymentError::AmountTooLow {
            amount_minor_units: amount,
            minimum: MIN_AMOUNT_MINOR_UNITS,
        });
    }
    if amount > MAX_AMOUNT_MINOR_UNITS {
        return Err(PaymentError::AmountTooHigh {
            amount_minor_units: amount,
            maximum: MAX_AMOUNT_MINOR_UNITS,
        });
    }
    Ok(amount)
}

/// Charge request handed to a [`crate::processor::PaymentProcessor`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationRequest {
    /// Correlation id of the originating HTTP request
    pub request_id: String,

    /// Amount in minor units (cents)
    pub amount_minor_units: i64,

    /// ISO 4217 currency code
    pub currency: &'static str,

    /// Sent unchanged on every attempt so retries cannot double-charge
    pub idempotency_key: String,

    /// Processor-side metadata
    pub metadata: BTreeMap<String, String>,
}

impl AuthorizationRequest {
    /// Build the request for a validated cart.
    ///
    /// The amount is derived from the claimed total, which the validator has
    /// already tied to the line items.
    pub fn from_cart(request_id: &str, cart: &ValidatedCart) -> PaymentResult<Self> {
        let amount_minor_units = checked_amount(cart.claimed_total)?;
        let metadata = order_metadata(request_id, &cart.items)?;

        Ok(Self {
            request_id: request_id.to_string(),
            amount_minor_units,
            currency: CHARGE_CURRENCY,
            idempotency_key: format!("cart-intent-{}", request_id),
            metadata,
        })
    }
}

/// Successful authorization, passed through to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationResult {
    /// Opaque secret the client uses to confirm the charge
    pub client_secret: String,

    /// Processor's id for the authorization
    pub intent_id: String,

    /// Amount in minor units
    pub amount_minor_units: i64,

    /// Number of processor calls it took
    pub attempts: u32,
}

/// Run every step between a parsed body and a ready-to-send request:
/// cart validation, optional catalog pricing, amount computation and metadata.
pub fn prepare_authorization(
    request_id: &str,
    items: &[CartLineItem],
    claimed_total: Decimal,
    catalog: Option<&PriceCatalog>,
) -> PaymentResult<AuthorizationRequest> {
    let cart = validate_cart(items, claimed_total)?;

    if let Some(catalog) = catalog {
        catalog.verify(&cart)?;
    }

    tracing::debug!(
        request_id,
        items = cart.items.len(),
        units = cart.item_count(),
        total = %cart.computed_total,
        "cart validated"
    );

    AuthorizationRequest::from_cart(request_id, &cart)
}

/// Metadata keys: `requestId`, `orderDigest` and the item snapshot, either in
/// `orderItems` or split over `orderItems_1..N` with `orderItemsParts = N`.
fn order_metadata(
    request_id: &str,
    items: &[ValidatedLineItem],
) -> PaymentResult<BTreeMap<String, String>> {
    let snapshot = serde_json::to_string(items)
        .map_err(|e| PaymentError::Serialization(format!("order snapshot: {}", e)))?;

    let mut metadata = BTreeMap::new();
    metadata.insert("requestId".to_string(), request_id.to_string());
    metadata.insert(
        "orderDigest".to_string(),
        hex::encode(Sha256::digest(snapshot.as_bytes())),
    );

    let chars: Vec<char> = snapshot.chars().collect();
    if chars.len() <= METADATA_VALUE_MAX_CHARS {
        metadata.insert("orderItems".to_string(), snapshot);
        return Ok(metadata);
    }

    let parts: Vec<String> = chars
        .chunks(METADATA_VALUE_MAX_CHARS)
        .map(|chunk| chunk.iter().collect())
        .collect();

    if parts.len() > MAX_SNAPSHOT_PARTS {
        return Err(CartError::TooLarge {
            parts: parts.len(),
            limit: MAX_SNAPSHOT_PARTS,
        }
        .into());
    }

    metadata.insert("orderItemsParts".to_string(), parts.len().to_string());
    for (i, part) in parts.into_iter().enumerate() {
        metadata.insert(format!("orderItems_{}", i + 1), part);
    }
    Ok(metadata)
}
