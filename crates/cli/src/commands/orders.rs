//! Order commands.

use alghazaly_core::{CustomerId, OrderStatus, Price};
use alghazaly_storefront::Storefront;
use serde::Serialize;

use super::{CommandError, print_json};

#[derive(Serialize)]
struct OrderRow<'a> {
    order_number: &'a str,
    status: OrderStatus,
    open: bool,
    units: u32,
    total: Option<String>,
}

/// Print orders, newest first as returned by the backend.
pub async fn list(storefront: &Storefront, customer: Option<&str>) -> Result<(), CommandError> {
    let orders = match customer {
        Some(id) => {
            storefront
                .queries()
                .customer_orders(&CustomerId::new(id))
                .await?
        }
        None => storefront.queries().orders().await?,
    };
    tracing::info!(count = orders.len(), "Loaded orders");

    let rows: Vec<_> = orders
        .iter()
        .map(|order| OrderRow {
            order_number: &order.order_number,
            status: order.status,
            open: order.status.is_open(),
            units: order.unit_count(),
            total: order.total.map(|total| Price::egp(total).display()),
        })
        .collect();
    print_json(&rows)
}
