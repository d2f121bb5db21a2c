//! Fake backend and helpers shared by unit tests.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alghazaly_core::{
    BundleGroupId, CartLine, CustomerId, DiscountDetails, FavoriteEntry, Order, ProductId,
    ProductSummary,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Notify;

use crate::api::{ApiError, CartAddRequest, StoreApi};
use crate::guard::{DuplicateNotice, DuplicateNotifier};

pub fn product(id: &str, price: i64) -> ProductSummary {
    ProductSummary {
        id: ProductId::new(id),
        name: format!("Part {id}"),
        name_ar: None,
        price: Decimal::new(price, 0),
        sku: None,
        image_url: None,
        stock_quantity: None,
    }
}

pub fn line(id: &str, quantity: u32, bundle: Option<&str>) -> CartLine {
    let product = product(id, 100);
    CartLine {
        product_id: product.id.clone(),
        quantity,
        bundle_group_id: bundle.map(BundleGroupId::new),
        original_unit_price: product.price,
        final_unit_price: product.price,
        discount_details: DiscountDetails::default(),
        product,
    }
}

#[derive(Default)]
pub struct CountingNotifier(pub AtomicUsize);

impl DuplicateNotifier for CountingNotifier {
    fn notify(&self, _notice: &DuplicateNotice) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Records calls; optionally fails or waits on a gate.
#[derive(Default)]
pub struct FakeApi {
    pub calls: Mutex<Vec<&'static str>>,
    pub fail: AtomicBool,
    pub gate: Option<Notify>,
    pub favorite_state: AtomicBool,
    /// Returned by `cart_get`.
    pub remote_cart: Mutex<Vec<CartLine>>,
}

impl FakeApi {
    pub fn shared(self) -> (Arc<Self>, Arc<dyn StoreApi>) {
        let api = Arc::new(self);
        let client: Arc<dyn StoreApi> = api.clone();
        (api, client)
    }

    /// Yield until the remote call has been made.
    pub async fn wait_for_call(&self) {
        self.wait_for_calls(1).await;
    }

    pub async fn wait_for_calls(&self, count: usize) {
        while self.call_count() < count {
            tokio::task::yield_now().await;
        }
    }

    pub fn failing() -> Self {
        let api = Self::default();
        api.fail.store(true, Ordering::SeqCst);
        api
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Notify::new()),
            ..Self::default()
        }
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    async fn respond(&self, call: &'static str) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(call);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl StoreApi for FakeApi {
    async fn cart_get(&self) -> Result<Vec<CartLine>, ApiError> {
        self.respond("cart_get").await?;
        Ok(self.remote_cart.lock().unwrap().clone())
    }

    async fn cart_add(&self, request: &CartAddRequest) -> Result<CartLine, ApiError> {
        self.respond("cart_add").await?;
        Ok(CartLine {
            product_id: request.product_id.clone(),
            quantity: request.quantity,
            bundle_group_id: request.bundle_group_id.clone(),
            original_unit_price: request.product.price,
            final_unit_price: request.product.price,
            discount_details: DiscountDetails::default(),
            product: request.product.clone(),
        })
    }

    async fn cart_update(&self, _: &ProductId, _: i64) -> Result<(), ApiError> {
        self.respond("cart_update").await
    }

    async fn cart_remove(&self, _: &ProductId) -> Result<(), ApiError> {
        self.respond("cart_remove").await
    }

    async fn cart_clear(&self) -> Result<(), ApiError> {
        self.respond("cart_clear").await
    }

    async fn cart_void_bundle(&self, _: &BundleGroupId) -> Result<(), ApiError> {
        self.respond("cart_void_bundle").await
    }

    async fn favorites_get_all(&self) -> Result<Vec<FavoriteEntry>, ApiError> {
        self.respond("favorites_get_all").await.map(|()| Vec::new())
    }

    async fn favorites_toggle(&self, _: &ProductId) -> Result<bool, ApiError> {
        self.respond("favorites_toggle").await?;
        Ok(!self.favorite_state.fetch_xor(true, Ordering::SeqCst))
    }

    async fn favorites_check(&self, _: &ProductId) -> Result<bool, ApiError> {
        self.respond("favorites_check").await?;
        Ok(self.favorite_state.load(Ordering::SeqCst))
    }

    async fn orders_get_all(&self) -> Result<Vec<Order>, ApiError> {
        self.respond("orders_get_all").await.map(|()| Vec::new())
    }

    async fn customer_cart(&self, _: &CustomerId) -> Result<Vec<CartLine>, ApiError> {
        self.respond("customer_cart").await.map(|()| Vec::new())
    }

    async fn customer_favorites(&self, _: &CustomerId) -> Result<Vec<FavoriteEntry>, ApiError> {
        self.respond("customer_favorites").await.map(|()| Vec::new())
    }

    async fn customer_orders(&self, _: &CustomerId) -> Result<Vec<Order>, ApiError> {
        self.respond("customer_orders").await.map(|()| Vec::new())
    }
}
