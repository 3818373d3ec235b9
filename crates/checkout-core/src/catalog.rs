//! # Price Catalog
//!
//! Authoritative unit prices per product/tier, loaded from `config/catalog.toml`.
//!
//! Catalog enforcement is opt-in. When disabled, the client's unit prices are
//! only checked for internal consistency by [`crate::cart::validate_cart`].

use crate::cart::{CartError, ValidatedCart};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A priced product tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Product reference (e.g., "rang-play-rs")
    pub product_ref: String,

    /// Tier/edition (e.g., "pro")
    pub tier: String,

    /// Unit price in major currency units
    pub unit_price: Decimal,

    /// Whether this entry is available for purchase
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl CatalogEntry {
    pub fn new(product_ref: impl Into<String>, tier: impl Into<String>, unit_price: Decimal) -> Self {
        Self {
            product_ref: product_ref.into(),
            tier: tier.into(),
            unit_price,
            active: true,
        }
    }
}

/// Price catalog (loaded from config)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceCatalog {
    #[serde(default)]
    pub entries: Vec<CatalogEntry>,
}

impl PriceCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add an entry to the catalog
    pub fn add(&mut self, entry: CatalogEntry) {
        self.entries.push(entry);
    }

    /// Builder: add an entry
    pub fn with_entry(mut self, entry: CatalogEntry) -> Self {
        self.add(entry);
        self
    }

    /// Authoritative price of an active product tier
    pub fn price_for(&self, product_ref: &str, tier: &str) -> Option<Decimal> {
        self.entries
            .iter()
            .find(|e| e.active && e.product_ref == product_ref && e.tier == tier)
            .map(|e| e.unit_price)
    }

    /// Check every submitted unit price against the catalog.
    ///
    /// Prices must match exactly; the first unknown or mispriced item fails.
    pub fn verify(&self, cart: &ValidatedCart) -> Result<(), CartError> {
        for (index, item) in cart.items.iter().enumerate() {
            let expected = self.price_for(&item.product_ref, &item.tier).ok_or_else(|| {
                CartError::UnknownProduct {
                    index,
                    product_ref: item.product_ref.clone(),
                    tier: item.tier.clone(),
                }
            })?;

            if expected != item.unit_price {
                return Err(CartError::PriceMismatch {
                    index,
                    submitted: item.unit_price,
                    expected,
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load catalog from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}
