//! Remote store client for the Al-Ghazaly backend.
//!
//! # Architecture
//!
//! - The backend is the source of truth for cart, favorites and orders
//! - [`StoreApi`] is the contract the cache layer consumes; [`RestClient`]
//!   implements it over HTTP with `reqwest`
//! - Every response body is decoded into a typed envelope. A missing field is
//!   a [`ApiError::Parse`], never an empty collection
//!
//! # Example
//!
//! ```rust,ignore
//! use alghazaly_storefront::api::{RestClient, StoreApi};
//!
//! let client = RestClient::new(&config.api)?;
//! let lines = client.cart_get().await?;
//! ```

mod client;
mod responses;

pub use client::RestClient;

use alghazaly_core::{
    BundleGroupId, BundleOfferId, CartLine, CustomerId, FavoriteEntry, Order, ProductId,
    ProductSummary,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// Session token missing, expired or rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Response body did not match the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The request could not be built (bad base URL, bad header value).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Whether retrying the same request later could succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::RateLimited(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Unauthorized(_)
            | Self::NotFound(_)
            | Self::Parse(_)
            | Self::InvalidRequest(_) => false,
        }
    }
}

/// Bundle membership for an add-to-cart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleSelection {
    /// Group shared by every line added from the same bundle.
    pub group_id: BundleGroupId,
    /// Marketing offer that defines the bundle.
    pub offer_id: Option<BundleOfferId>,
    /// Discount applied to each bundled line, in percent.
    pub discount_percentage: Decimal,
}

/// Request body for `POST /api/cart/add`.
///
/// Carries the [`ProductSummary`] alongside the wire fields so the client can
/// return a complete [`CartLine`]; the backend only echoes pricing.
#[derive(Debug, Clone, Serialize)]
pub struct CartAddRequest {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_group_id: Option<BundleGroupId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_offer_id: Option<BundleOfferId>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub bundle_discount_percentage: Option<Decimal>,
    #[serde(skip)]
    pub product: ProductSummary,
}

impl CartAddRequest {
    /// Add `quantity` units of a product as a standalone line.
    #[must_use]
    pub fn new(product: ProductSummary, quantity: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            quantity,
            bundle_group_id: None,
            bundle_offer_id: None,
            bundle_discount_percentage: None,
            product,
        }
    }

    /// Mark the line as part of a bundle.
    #[must_use]
    pub fn in_bundle(mut self, bundle: &BundleSelection) -> Self {
        self.bundle_group_id = Some(bundle.group_id.clone());
        self.bundle_offer_id.clone_from(&bundle.offer_id);
        self.bundle_discount_percentage = Some(bundle.discount_percentage);
        self
    }
}

/// Contract between the cache layer and the backend.
///
/// Implementations must be cheap to share across tasks; the cache layer holds
/// them behind an `Arc` and calls them from background refetches.
#[async_trait]
pub trait StoreApi: Send + Sync + 'static {
    /// `GET /api/cart` - current cart lines with server pricing.
    async fn cart_get(&self) -> Result<Vec<CartLine>, ApiError>;

    /// `POST /api/cart/add` - add a line; the backend prices it.
    async fn cart_add(&self, request: &CartAddRequest) -> Result<CartLine, ApiError>;

    /// `PUT /api/cart/update` - set a line's quantity. Zero or less removes it.
    async fn cart_update(&self, product_id: &ProductId, quantity: i64) -> Result<(), ApiError>;

    /// Remove a product's line.
    async fn cart_remove(&self, product_id: &ProductId) -> Result<(), ApiError>;

    /// `DELETE /api/cart/clear` - empty the cart.
    async fn cart_clear(&self) -> Result<(), ApiError>;

    /// `DELETE /api/cart/void-bundle/{id}` - drop a bundle's discount.
    async fn cart_void_bundle(&self, bundle_group_id: &BundleGroupId) -> Result<(), ApiError>;

    /// `GET /api/favorites` - favorited products.
    async fn favorites_get_all(&self) -> Result<Vec<FavoriteEntry>, ApiError>;

    /// `POST /api/favorites/toggle` - flip membership, returning the new state.
    async fn favorites_toggle(&self, product_id: &ProductId) -> Result<bool, ApiError>;

    /// `GET /api/favorites/check/{id}` - whether a product is favorited.
    async fn favorites_check(&self, product_id: &ProductId) -> Result<bool, ApiError>;

    /// `GET /api/orders` - the customer's orders, newest first.
    async fn orders_get_all(&self) -> Result<Vec<Order>, ApiError>;

    /// Staff view of a customer's cart.
    async fn customer_cart(&self, customer_id: &CustomerId) -> Result<Vec<CartLine>, ApiError>;

    /// Staff view of a customer's favorites.
    async fn customer_favorites(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Vec<FavoriteEntry>, ApiError>;

    /// Staff view of a customer's orders.
    async fn customer_orders(&self, customer_id: &CustomerId) -> Result<Vec<Order>, ApiError>;
}
