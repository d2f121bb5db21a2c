//! Favorites commands.

use alghazaly_core::{CustomerId, Price, ProductId, ProductSummary};
use alghazaly_storefront::Storefront;
use serde::Serialize;
use serde_json::json;

use super::{CommandError, print_json};

#[derive(Serialize)]
struct FavoriteRow<'a> {
    product_id: &'a ProductId,
    name: &'a str,
    price: String,
}

/// Print favorites, named in the configured locale.
pub async fn list(storefront: &Storefront, customer: Option<&str>) -> Result<(), CommandError> {
    let favorites = match customer {
        Some(id) => {
            storefront
                .queries()
                .customer_favorites(&CustomerId::new(id))
                .await?
        }
        None => storefront.queries().favorites().await?,
    };
    let locale = storefront.config().locale;
    let rows: Vec<_> = favorites
        .iter()
        .map(|entry| FavoriteRow {
            product_id: &entry.product_id,
            name: entry.product.localized_name(locale),
            price: Price::egp(entry.product.price).display(),
        })
        .collect();
    print_json(&rows)
}

/// Flip a product's favorite status and print the new state.
pub async fn toggle(storefront: &Storefront, product: &ProductSummary) -> Result<(), CommandError> {
    let is_favorite = storefront.mutations().toggle_favorite(product).await?;
    print_json(&json!({
        "product_id": product.id,
        "is_favorite": is_favorite,
    }))
}
