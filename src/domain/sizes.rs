//! Size-set extraction and the stock diff.

use std::collections::BTreeSet;

use serde::Deserialize;

use super::product::Product;

/// Set of size labels. Ordered so listings and snapshots are stable.
pub type SizeSet = BTreeSet<String>;

/// How a variant without an `inStock` flag is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockPolicy {
    /// Missing flag means purchasable.
    #[default]
    AssumeInStock,
    /// Only an explicit `true` counts.
    RequireExplicit,
}

impl StockPolicy {
    fn counts(self, in_stock: Option<bool>) -> bool {
        match (self, in_stock) {
            (_, Some(flag)) => flag,
            (Self::AssumeInStock, None) => true,
            (Self::RequireExplicit, None) => false,
        }
    }
}

/// Labels of all currently purchasable sizes of a product.
pub fn extract_sizes(product: &Product, policy: StockPolicy) -> SizeSet {
    product
        .variants()
        .iter()
        .filter(|v| policy.counts(v.in_stock))
        .filter_map(|v| v.label())
        .map(ToString::to_string)
        .collect()
}

/// Difference between two consecutive size sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeDiff {
    /// In the previous set, absent from the current one.
    pub sold_out: SizeSet,
    /// In the current set, absent from the previous one.
    pub restocked: SizeSet,
}

impl SizeDiff {
    pub fn between(previous: &SizeSet, current: &SizeSet) -> Self {
        Self {
            sold_out: previous.difference(current).cloned().collect(),
            restocked: current.difference(previous).cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sold_out.is_empty() && self.restocked.is_empty()
    }
}

/// Joins sizes for a notification line.
pub fn join_sizes(sizes: &SizeSet) -> String {
    sizes.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
