//! Upstream product record as delivered by the category API.
//!
//! Every field is optional: the feed is consumed as-is and missing
//! data is defaulted downstream (placeholder price, empty size set)
//! rather than rejected.

use serde::{Deserialize, Deserializer, Serialize};

/// Stable upstream identifier for a product.
pub type ProductCode = String;

/// A single product record from the listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Upstream code. Delivered as either a JSON string or number.
    #[serde(default, deserialize_with = "string_or_number")]
    pub code: Option<ProductCode>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Product images; only the first one is used.
    #[serde(default)]
    pub images: Vec<ProductImage>,
    /// Path relative to the site origin.
    #[serde(default)]
    pub url: Option<String>,
    /// Discounted price, when the product is on offer.
    #[serde(default)]
    pub offer_price: Option<PriceField>,
    /// Regular list price.
    #[serde(default)]
    pub price: Option<PriceField>,
    /// Primary variant list.
    #[serde(default)]
    pub sku_list: Option<Vec<Variant>>,
    /// Fallback variant list used by some category payloads.
    #[serde(default)]
    pub variant_options: Option<Vec<Variant>>,
}

/// Image entry of a product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductImage {
    #[serde(default)]
    pub url: Option<String>,
}

/// A price sub-structure (`offerPrice` or `price`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceField {
    /// Numeric amount.
    #[serde(default)]
    pub value: Option<f64>,
    /// Pre-formatted display string, e.g. `₹499`.
    #[serde(
        default,
        rename = "displayformattedValue",
        alias = "formattedValue"
    )]
    pub display: Option<String>,
}

/// A purchasable variant (usually one per size).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub size_name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    /// Stock flag. `None` when the payload omits it.
    #[serde(default)]
    pub in_stock: Option<bool>,
}

impl Product {
    /// URL of the first image, if any.
    pub fn image_url(&self) -> Option<&str> {
        self.images
            .first()
            .and_then(|img| img.url.as_deref())
            .filter(|url| !url.trim().is_empty())
    }

    /// Display name, falling back to the code.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(self.code.as_deref())
            .unwrap_or("Unnamed product")
    }

    /// Absolute product link built from the site origin.
    pub fn link(&self, site_origin: &str) -> String {
        let path = self.url.as_deref().unwrap_or_default();
        format!("{}{}", site_origin.trim_end_matches('/'), path)
    }

    /// Variant list in effect: `skuList`, or `variantOptions` when
    /// `skuList` is missing or empty.
    pub fn variants(&self) -> &[Variant] {
        match self.sku_list.as_deref() {
            Some(list) if !list.is_empty() => list,
            _ => self.variant_options.as_deref().unwrap_or_default(),
        }
    }
}

impl Variant {
    /// First non-blank size label among `size`, `sizeName`, `value`.
    pub fn label(&self) -> Option<&str> {
        [&self.size, &self.size_name, &self.value]
            .into_iter()
            .filter_map(|s| s.as_deref())
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => {
            Some(s.trim().to_string())
        }
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
