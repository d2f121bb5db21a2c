//! Typed envelopes for backend response bodies.
//!
//! Each endpoint's body is decoded into exactly one of these structs. The
//! envelopes have no `#[serde(default)]` on their payload fields: an absent
//! `items` or `favorites` array means the backend broke its contract, and the
//! caller gets a parse error instead of an empty cart.

use alghazaly_core::{
    BundleGroupId, CartLine, DiscountDetails, FavoriteEntry, Order, ProductId, ProductSummary,
};
use rust_decimal::Decimal;
use serde::Deserialize;

/// `GET /api/cart` and `GET /api/admin/customer/{id}/cart`.
#[derive(Debug, Deserialize)]
pub struct CartResponse {
    pub items: Vec<CartLine>,
}

/// `POST /api/cart/add`.
#[derive(Debug, Deserialize)]
pub struct CartAddResponse {
    pub item: AddedCartItem,
}

/// The line as stored by the backend, without product details.
#[derive(Debug, Deserialize)]
pub struct AddedCartItem {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub original_unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub final_unit_price: Decimal,
    #[serde(default)]
    pub discount_details: DiscountDetails,
    #[serde(default)]
    pub bundle_group_id: Option<BundleGroupId>,
}

impl AddedCartItem {
    /// Attach the product the request was made for.
    pub fn into_cart_line(self, product: ProductSummary) -> CartLine {
        CartLine {
            product_id: self.product_id,
            quantity: self.quantity,
            bundle_group_id: self.bundle_group_id,
            original_unit_price: self.original_unit_price,
            final_unit_price: self.final_unit_price,
            discount_details: self.discount_details,
            product,
        }
    }
}

/// `GET /api/favorites` and `GET /api/admin/customer/{id}/favorites`.
#[derive(Debug, Deserialize)]
pub struct FavoritesResponse {
    pub favorites: Vec<FavoriteEntry>,
}

/// `POST /api/favorites/toggle` and `GET /api/favorites/check/{id}`.
#[derive(Debug, Deserialize)]
pub struct FavoriteStatusResponse {
    pub is_favorite: bool,
}

/// `GET /api/admin/customer/{id}/orders`.
#[derive(Debug, Deserialize)]
pub struct CustomerOrdersResponse {
    pub orders: Vec<Order>,
}

/// Acknowledgement returned by mutating cart endpoints.
#[derive(Debug, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
