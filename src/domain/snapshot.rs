//! Last-known stock per product code.
//!
//! Serialized as a flat JSON object keyed by product code, each value
//! holding a `sizes` array. Entries are overwritten wholesale on every
//! sighting and never removed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::product::ProductCode;
use super::sizes::SizeSet;

/// Stored state of a single product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedProduct {
    /// In-stock sizes as of the most recent successful poll.
    #[serde(default)]
    pub sizes: SizeSet,
}

/// Mapping of product code to tracked state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    products: BTreeMap<ProductCode, TrackedProduct>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, code: &str) -> Option<&TrackedProduct> {
        self.products.get(code)
    }

    /// Replace the size set of a product, creating it on first sighting.
    ///
    /// Returns the previous entry, if any.
    pub fn upsert_sizes(
        &mut self,
        code: impl Into<ProductCode>,
        sizes: SizeSet,
    ) -> Option<TrackedProduct> {
        self.products.insert(code.into(), TrackedProduct { sizes })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProductCode, &TrackedProduct)> {
        self.products.iter()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
