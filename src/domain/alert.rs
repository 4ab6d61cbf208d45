//! Stock alerts and their Telegram HTML rendering.

use std::borrow::Cow;

use super::sizes::{SizeSet, join_sizes};

/// Longest product name shown in an alert.
///
/// Keeps a photo caption under Telegram's 1024 visible characters
/// without cutting through the HTML markup.
pub const MAX_NAME_CHARS: usize = 200;

/// Kind of alert, used for logging and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    NewProduct,
    Restocked,
    SoldOut,
}

impl AlertKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NewProduct => "new_product",
            Self::Restocked => "restocked",
            Self::SoldOut => "sold_out",
        }
    }
}

/// A notification about one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    NewProduct {
        name: String,
        price: String,
        sizes: SizeSet,
        voucher: Option<String>,
        link: String,
        image_url: Option<String>,
    },
    Restocked {
        name: String,
        sizes: SizeSet,
        link: String,
    },
    SoldOut {
        name: String,
        sizes: SizeSet,
        link: String,
    },
}

impl Alert {
    pub fn kind(&self) -> AlertKind {
        match self {
            Self::NewProduct { .. } => AlertKind::NewProduct,
            Self::Restocked { .. } => AlertKind::Restocked,
            Self::SoldOut { .. } => AlertKind::SoldOut,
        }
    }

    /// Image to send as a photo; only new-product alerts carry one.
    pub fn image_url(&self) -> Option<&str> {
        match self {
            Self::NewProduct { image_url, .. } => image_url.as_deref(),
            _ => None,
        }
    }

    /// Message body in Telegram HTML.
    pub fn render(&self) -> String {
        match self {
            Self::NewProduct {
                name,
                price,
                sizes,
                voucher,
                link,
                ..
            } => {
                let sizes = if sizes.is_empty() {
                    "Available".to_string()
                } else {
                    escape_html(&join_sizes(sizes))
                };
                let mut text = format!(
                    "🆕 <b>NEW PRODUCT</b>\n\n🛍 <b>{}</b>\n💰 {}\n📦 Sizes: {}\n",
                    escape_html(&shorten(name, MAX_NAME_CHARS)),
                    escape_html(price),
                    sizes,
                );
                if let Some(voucher) = voucher {
                    text.push_str(&format!("\n🎟 {}\n", escape_html(voucher)));
                }
                text.push_str(&format!("\n🔗 {}\n", escape_html(link)));
                text
            }
            Self::Restocked { name, sizes, link } => format!(
                "🔁 <b>SIZE RESTOCKED</b>\n\n🛍 <b>{}</b>\n✅ Restocked: {}\n\n🔗 {}\n",
                escape_html(&shorten(name, MAX_NAME_CHARS)),
                escape_html(&join_sizes(sizes)),
                escape_html(link),
            ),
            Self::SoldOut { name, sizes, link } => format!(
                "⚠️ <b>SIZE SOLD OUT</b>\n\n🛍 <b>{}</b>\n❌ Sold Out: {}\n\n🔗 {}\n",
                escape_html(&shorten(name, MAX_NAME_CHARS)),
                escape_html(&join_sizes(sizes)),
                escape_html(link),
            ),
        }
    }
}

/// First `max` characters of `text`, with `…` appended when cut.
pub fn shorten(text: &str, max: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max.saturating_sub(1)) {
        Some((idx, _)) if text[idx..].chars().count() > 1 => {
            Cow::Owned(format!("{}…", &text[..idx]))
        }
        _ => Cow::Borrowed(text),
    }
}

/// Escapes the characters Telegram's HTML parse mode treats as markup.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
