//! Product data embedded in cart lines, favorites and order items.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::id::ProductId;
use crate::types::locale::Locale;

/// The subset of a catalog product the client needs to render a card.
///
/// The backend returns the full product document; unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    /// Product ID.
    pub id: ProductId,
    /// English display name.
    pub name: String,
    /// Arabic display name.
    #[serde(default)]
    pub name_ar: Option<String>,
    /// Current catalog unit price.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// SKU code.
    #[serde(default)]
    pub sku: Option<String>,
    /// Primary image URL.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Units in stock, if tracked.
    #[serde(default)]
    pub stock_quantity: Option<i64>,
}

impl ProductSummary {
    /// Display name for a locale, falling back to English when no Arabic
    /// name was entered.
    #[must_use]
    pub fn localized_name(&self, locale: Locale) -> &str {
        match locale {
            Locale::Ar => self.name_ar.as_deref().unwrap_or(&self.name),
            Locale::En => &self.name,
        }
    }
}
