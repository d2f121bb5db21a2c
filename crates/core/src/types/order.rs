//! Placed orders, as returned by the backend.
//!
//! Orders are read-only from the client's perspective: they are created and
//! priced server-side from the cart and only ever listed here.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::cart::DiscountDetails;
use crate::types::id::{BundleGroupId, OrderId, ProductId};
use crate::types::status::OrderStatus;

/// A line item captured at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Ordered product.
    pub product_id: ProductId,
    /// Product name at the time of ordering.
    pub product_name: String,
    /// Arabic product name at the time of ordering.
    #[serde(default)]
    pub product_name_ar: Option<String>,
    /// Quantity ordered.
    pub quantity: u32,
    /// Unit price before discounts.
    #[serde(with = "rust_decimal::serde::float")]
    pub original_unit_price: Decimal,
    /// Unit price actually charged.
    #[serde(with = "rust_decimal::serde::float")]
    pub final_unit_price: Decimal,
    /// Discount applied to the item.
    #[serde(default)]
    pub discount_details: DiscountDetails,
    /// Bundle the item was bought in.
    #[serde(default)]
    pub bundle_group_id: Option<BundleGroupId>,
    /// Product image at the time of ordering.
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A customer order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order ID.
    pub id: OrderId,
    /// Human-readable order number (e.g., `ORD-20250101120000-AB12`).
    pub order_number: String,
    /// Fulfillment status.
    pub status: OrderStatus,
    /// Sum of undiscounted item amounts.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub subtotal: Option<Decimal>,
    /// Total discount granted.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total_discount: Option<Decimal>,
    /// Flat shipping cost charged.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub shipping_cost: Option<Decimal>,
    /// Amount charged.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total: Option<Decimal>,
    /// Creation timestamp as sent by the backend.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Ordered items.
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Number of units across all items, saturating at `u32::MAX`.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0, |count: u32, i| count.saturating_add(i.quantity))
    }
}
