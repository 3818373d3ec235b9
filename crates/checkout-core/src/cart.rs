//! # Cart Types
//!
//! Cart submission types and the cart integrity validator.
//!
//! Everything the client sends is untrusted: line items arrive with every
//! field optional so that a missing field is reported as a cart error naming
//! the offending item, not as an opaque decode failure.

use crate::error::{PaymentError, PaymentResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Absolute tolerance between the recomputed and the claimed total (one cent)
pub fn total_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

/// A line item as submitted by the client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    /// Catalog reference of the priced item
    #[serde(default)]
    pub product_ref: Option<String>,

    /// Variant selector (tier/edition)
    #[serde(default)]
    pub tier: Option<String>,

    /// Quantity, must be >= 1
    #[serde(default)]
    pub quantity: Option<i64>,

    /// Unit price in major currency units, must be > 0
    #[serde(default)]
    pub unit_price: Option<Decimal>,
}

impl CartLineItem {
    /// Create a fully populated line item
    pub fn new(
        product_ref: impl Into<String>,
        tier: impl Into<String>,
        quantity: i64,
        unit_price: Decimal,
    ) -> Self {
        Self {
            product_ref: Some(product_ref.into()),
            tier: Some(tier.into()),
            quantity: Some(quantity),
            unit_price: Some(unit_price),
        }
    }
}

/// Request body of the payment-intent endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CartSubmission {
    /// Line items, in evaluation order
    #[serde(default)]
    pub items: Option<Vec<CartLineItem>>,

    /// Client-declared total in major currency units
    #[serde(default)]
    pub amount: Option<Decimal>,
}

impl CartSubmission {
    /// Decode a submission from a raw JSON body
    pub fn from_slice(body: &[u8]) -> PaymentResult<Self> {
        serde_json::from_slice(body)
            .map_err(|e| PaymentError::MalformedRequest(format!("body is not a valid cart: {}", e)))
    }

    /// Split into items and claimed total, rejecting absent fields
    pub fn into_parts(self) -> PaymentResult<(Vec<CartLineItem>, Decimal)> {
        match (self.items, self.amount) {
            (Some(items), Some(amount)) => Ok((items, amount)),
            (None, Some(_)) => Err(PaymentError::MalformedRequest(
                "Missing required fields: items".to_string(),
            )),
            (Some(_), None) => Err(PaymentError::MalformedRequest(
                "Missing required fields: amount".to_string(),
            )),
            (None, None) => Err(PaymentError::MalformedRequest(
                "Missing required fields: items, amount".to_string(),
            )),
        }
    }
}

/// A line item that passed every structural check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedLineItem {
    pub product_ref: String,
    pub tier: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl ValidatedLineItem {
    /// Calculate the total price for this line item
    pub fn total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}

/// A cart whose items and total have been cross-checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCart {
    /// Items in submission order
    pub items: Vec<ValidatedLineItem>,
    /// Sum of `unit_price * quantity`
    pub computed_total: Decimal,
    /// Total declared by the client
    pub claimed_total: Decimal,
}

impl ValidatedCart {
    /// Get item count
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }
}

/// Reasons a cart is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("Invalid cart: cart is empty")]
    Empty,

    #[error("Invalid cart item structure: items[{index}].{field} is missing")]
    MissingField { index: usize, field: &'static str },

    #[error("Invalid quantity for items[{index}]: {quantity}")]
    InvalidQuantity { index: usize, quantity: i64 },

    #[error("Invalid price for items[{index}]: {unit_price}")]
    InvalidPrice { index: usize, unit_price: Decimal },

    #[error("Invalid cart: total overflows at items[{index}]")]
    Overflow { index: usize },

    #[error("Invalid cart total: items add up to {computed}, claimed {claimed}")]
    TotalMismatch { computed: Decimal, claimed: Decimal },

    #[error("Invalid cart item: items[{index}] ({product_ref}/{tier}) is not in the catalog")]
    UnknownProduct {
        index: usize,
        product_ref: String,
        tier: String,
    },

    #[error("Invalid price for items[{index}]: submitted {submitted}, catalog price is {expected}")]
    PriceMismatch {
        index: usize,
        submitted: Decimal,
        expected: Decimal,
    },

    #[error("Invalid cart: order snapshot needs {parts} metadata parts, limit is {limit}")]
    TooLarge { parts: usize, limit: usize },
}

impl CartError {
    /// True for field presence/bounds failures, as opposed to totals or pricing
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            CartError::Empty
                | CartError::MissingField { .. }
                | CartError::InvalidQuantity { .. }
                | CartError::InvalidPrice { .. }
                | CartError::Overflow { .. }
        )
    }

    /// Stable machine-readable category
    pub fn code(&self) -> &'static str {
        match self {
            CartError::TotalMismatch { .. } => "total_mismatch",
            CartError::UnknownProduct { .. } => "unknown_product",
            CartError::PriceMismatch { .. } => "price_mismatch",
            CartError::TooLarge { .. } => "cart_too_large",
            _ => "invalid_cart",
        }
    }
}

/// Validate a cart against its claimed total.
///
/// Items are checked in submission order and the first offending item fails
/// the whole cart. The total is accumulated in the same order, then compared
/// with `claimed_total` within [`total_tolerance`].
pub fn validate_cart(
    items: &[CartLineItem],
    claimed_total: Decimal,
) -> Result<ValidatedCart, CartError> {
    if items.is_empty() {
        return Err(CartError::Empty);
    }

    let mut validated = Vec::with_capacity(items.len());
    let mut computed_total = Decimal::ZERO;

    for (index, item) in items.iter().enumerate() {
        let line = validate_line_item(index, item)?;
        computed_total = line
            .total()
            .and_then(|line_total| computed_total.checked_add(line_total))
            .ok_or(CartError::Overflow { index })?;
        validated.push(line);
    }

    let within_tolerance = computed_total
        .checked_sub(claimed_total)
        .is_some_and(|diff| diff.abs() <= total_tolerance());
    if !within_tolerance {
        return Err(CartError::TotalMismatch {
            computed: computed_total,
            claimed: claimed_total,
        });
    }

    Ok(ValidatedCart {
        items: validated,
        computed_total,
        claimed_total,
    })
}

fn validate_line_item(index: usize, item: &CartLineItem) -> Result<ValidatedLineItem, CartError> {
    let missing = |field| CartError::MissingField { index, field };

    let product_ref = non_blank(item.product_ref.as_deref()).ok_or_else(|| missing("productRef"))?;
    let tier = non_blank(item.tier.as_deref()).ok_or_else(|| missing("tier"))?;
    let quantity = item.quantity.ok_or_else(|| missing("quantity"))?;
    let unit_price = item.unit_price.ok_or_else(|| missing("unitPrice"))?;

    let quantity = u32::try_from(quantity)
        .ok()
        .filter(|q| *q >= 1)
        .ok_or(CartError::InvalidQuantity { index, quantity })?;

    if unit_price <= Decimal::ZERO {
        return Err(CartError::InvalidPrice { index, unit_price });
    }

    Ok(ValidatedLineItem {
        product_ref: product_ref.to_string(),
        tier: tier.to_string(),
        quantity,
        unit_price,
    })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
