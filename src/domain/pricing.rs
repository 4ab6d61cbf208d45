//! Price resolution and voucher hints.
//!
//! Picks the customer-facing price out of the optional offer/regular
//! sub-structures. Amounts are compared as `Decimal` so that equal
//! prices tie deterministically regardless of float formatting.

use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use serde::Deserialize;

use super::product::{PriceField, Product};

/// Display string used when the record carries no usable price.
pub const PRICE_PLACEHOLDER: &str = "Price N/A";

/// Resolved price of a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPrice {
    /// Numeric amount (zero for the placeholder).
    pub value: Decimal,
    /// Display string.
    pub display: String,
}

impl ResolvedPrice {
    /// The placeholder for products without any price.
    pub fn placeholder() -> Self {
        Self {
            value: Decimal::ZERO,
            display: PRICE_PLACEHOLDER.to_string(),
        }
    }

    /// Whether this is a real price rather than the placeholder.
    pub fn is_known(&self) -> bool {
        !self.value.is_zero()
    }
}

/// Resolves the price to show for a product.
#[derive(Debug, Clone)]
pub struct PriceResolver {
    /// Prefix used when a price has no pre-formatted display string.
    currency_symbol: String,
}

impl PriceResolver {
    pub fn new(currency_symbol: impl Into<String>) -> Self {
        Self {
            currency_symbol: currency_symbol.into(),
        }
    }

    /// Resolve the price of a product.
    ///
    /// Offer and regular are each used when present; when both are,
    /// the lower amount wins and ties go to the regular price. Zero
    /// or non-finite amounts count as absent.
    pub fn resolve(&self, product: &Product) -> ResolvedPrice {
        let offer = product.offer_price.as_ref().and_then(usable_amount);
        let regular = product.price.as_ref().and_then(usable_amount);

        let chosen = match (offer, regular) {
            (Some(o), Some(r)) => {
                if o.0 < r.0 {
                    o
                } else {
                    r
                }
            }
            (Some(o), None) => o,
            (None, Some(r)) => r,
            (None, None) => return ResolvedPrice::placeholder(),
        };

        let (value, field) = chosen;
        let display = field
            .display
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map_or_else(|| self.format(value), ToString::to_string);

        ResolvedPrice { value, display }
    }

    fn format(&self, value: Decimal) -> String {
        format!("{}{}", self.currency_symbol, value.normalize())
    }
}

impl Default for PriceResolver {
    fn default() -> Self {
        Self::new("₹")
    }
}

fn usable_amount(field: &PriceField) -> Option<(Decimal, &PriceField)> {
    let value = field.value.filter(|v| v.is_finite() && *v != 0.0)?;
    let amount = Decimal::from_f64(value)?;
    Some((amount, field))
}

/// One voucher tier: prices strictly below `below` get `label`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VoucherTier {
    pub below: f64,
    pub label: String,
}

/// Maps a price to a voucher suggestion line.
#[derive(Debug, Clone)]
pub struct VoucherHints {
    /// Tiers sorted by ascending threshold.
    tiers: Vec<(Decimal, String)>,
    /// Label for prices above every tier.
    fallback: Option<String>,
}

impl VoucherHints {
    pub fn new(tiers: &[VoucherTier], fallback: &str) -> Self {
        let mut tiers: Vec<(Decimal, String)> = tiers
            .iter()
            .filter_map(|t| Decimal::from_f64(t.below).map(|b| (b, t.label.clone())))
            .collect();
        tiers.sort_by(|a, b| a.0.cmp(&b.0));

        let fallback = Some(fallback.trim())
            .filter(|f| !f.is_empty())
            .map(ToString::to_string);

        Self { tiers, fallback }
    }

    /// Hint for a resolved price; `None` for the placeholder.
    pub fn hint_for(&self, price: &ResolvedPrice) -> Option<&str> {
        if !price.is_known() {
            return None;
        }
        self.tiers
            .iter()
            .find(|(below, _)| price.value < *below)
            .map(|(_, label)| label.as_str())
            .or(self.fallback.as_deref())
    }
}
