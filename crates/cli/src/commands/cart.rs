//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! ag-cli cart show
//! ag-cli cart add <product-id> --price 250 --quantity 2
//! ag-cli cart set <product-id> 3
//! ag-cli cart remove <product-id>
//! ag-cli cart void-bundle <bundle-group-id>
//! ag-cli cart clear
//! ```

use alghazaly_core::{
    BundleGroupId, CartLine, CustomerId, OrderSummary, Price, ProductId, ProductSummary,
};
use alghazaly_storefront::Storefront;
use alghazaly_storefront::mutation::MutationOutcome;
use serde::Serialize;

use super::{CommandError, print_json};

#[derive(Serialize)]
struct CartView {
    lines: Vec<CartLine>,
    summary: OrderSummary,
    /// Grand total formatted for display.
    amount_due: String,
}

/// Print the cart and its checkout summary.
pub async fn show(storefront: &Storefront, customer: Option<&str>) -> Result<(), CommandError> {
    let (lines, summary) = match customer {
        Some(id) => {
            let lines = storefront
                .queries()
                .customer_cart(&CustomerId::new(id))
                .await?;
            let summary = OrderSummary::new(&lines, storefront.config().shipping_cost);
            (lines, summary)
        }
        None => {
            let summary = storefront.queries().order_summary().await?;
            (storefront.queries().cart().await?, summary)
        }
    };
    print_json(&CartView {
        lines,
        summary,
        amount_due: Price::egp(summary.grand_total).display(),
    })
}

/// Add a product, after loading the cart so duplicates are caught locally.
pub async fn add(
    storefront: &Storefront,
    product: ProductSummary,
    quantity: u32,
) -> Result<(), CommandError> {
    storefront.queries().cart().await?;

    match storefront.mutations().add(&product, quantity).await? {
        MutationOutcome::Confirmed(line) => {
            tracing::info!(
                product_id = %line.product_id,
                quantity = line.quantity,
                "Added to cart"
            );
            print_json(&line)
        }
        MutationOutcome::Rejected(rejection) => {
            tracing::warn!(product_id = %rejection.product_id, "Product already in cart");
            Ok(())
        }
    }
}

/// Set a line's quantity.
pub async fn set_quantity(
    storefront: &Storefront,
    product_id: String,
    quantity: i64,
) -> Result<(), CommandError> {
    storefront
        .mutations()
        .update_quantity(&ProductId::new(product_id), quantity)
        .await?;
    tracing::info!(quantity, "Quantity updated");
    Ok(())
}

/// Remove a product's line.
pub async fn remove(storefront: &Storefront, product_id: String) -> Result<(), CommandError> {
    let product_id = ProductId::new(product_id);
    storefront.mutations().remove(&product_id).await?;
    tracing::info!(product_id = %product_id, "Removed from cart");
    Ok(())
}

/// Empty the cart.
pub async fn clear(storefront: &Storefront) -> Result<(), CommandError> {
    storefront.mutations().clear().await?;
    tracing::info!("Cart cleared");
    Ok(())
}

/// Drop a bundle's discount.
pub async fn void_bundle(
    storefront: &Storefront,
    bundle_group_id: String,
) -> Result<(), CommandError> {
    let bundle_group_id = BundleGroupId::new(bundle_group_id);
    storefront.mutations().void_bundle(&bundle_group_id).await?;
    tracing::info!(bundle_group_id = %bundle_group_id, "Bundle voided");
    Ok(())
}
