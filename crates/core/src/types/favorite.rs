//! Favorite (wishlist) entries.

use serde::{Deserialize, Serialize};

use crate::types::id::ProductId;
use crate::types::product::ProductSummary;

/// A product the customer marked as favorite.
///
/// Presence is binary: a product is either in the favorites list once or not
/// at all. Entries are created and destroyed by toggling, never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    /// Favorited product ID.
    pub product_id: ProductId,
    /// Product details for rendering.
    pub product: ProductSummary,
}

impl FavoriteEntry {
    /// Build an entry for a product.
    #[must_use]
    pub fn for_product(product: ProductSummary) -> Self {
        Self {
            product_id: product.id.clone(),
            product,
        }
    }
}
