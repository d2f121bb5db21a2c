//! Integration tests for the Al-Ghazaly storefront client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p alghazaly-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_sync` - optimistic cart mutations, duplicate guard, rollback
//! - `favorites_sync` - favorite toggles and reconciliation
//! - `read_path` - stale-while-revalidate reads and totals
//! - `client_contract` - `RestClient` against a stub HTTP backend
//!
//! Everything except `client_contract` runs against [`FakeStore`], an
//! in-memory backend that prices and merges cart lines the way the real
//! server does.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use alghazaly_core::{
    BundleGroupId, BundleOfferId, CartLine, CustomerId, DiscountDetails, FavoriteEntry, Locale,
    Order, ProductId, ProductSummary, apply_percentage_discount,
};
use alghazaly_storefront::Storefront;
use alghazaly_storefront::api::{ApiError, BundleSelection, CartAddRequest, StoreApi};
use alghazaly_storefront::config::{ApiConfig, CacheConfig, StorefrontConfig};
use alghazaly_storefront::guard::{DuplicateNotice, DuplicateNotifier};
use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::SecretString;
use tokio::sync::Notify;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A catalog product priced in whole pounds.
#[must_use]
pub fn product(id: &str, price: i64) -> ProductSummary {
    ProductSummary {
        id: ProductId::new(id),
        name: format!("Part {id}"),
        name_ar: Some(format!("قطعة {id}")),
        price: Decimal::new(price, 0),
        sku: Some(format!("SKU-{id}")),
        image_url: None,
        stock_quantity: Some(10),
    }
}

/// A bundle offering `percentage` off each product.
#[must_use]
pub fn bundle(group_id: &str, percentage: i64) -> BundleSelection {
    BundleSelection {
        group_id: BundleGroupId::new(group_id),
        offer_id: Some(BundleOfferId::new(format!("offer-{group_id}"))),
        discount_percentage: Decimal::new(percentage, 0),
    }
}

/// A cart line as the backend stores it.
#[must_use]
pub fn line(product: &ProductSummary, quantity: u32, bundle: Option<&BundleSelection>) -> CartLine {
    let mut line = CartLine {
        product_id: product.id.clone(),
        quantity,
        bundle_group_id: None,
        original_unit_price: product.price,
        final_unit_price: product.price,
        discount_details: DiscountDetails::default(),
        product: product.clone(),
    };
    if let Some(bundle) = bundle {
        line.bundle_group_id = Some(bundle.group_id.clone());
        if let Ok(price) = apply_percentage_discount(product.price, bundle.discount_percentage) {
            line.final_unit_price = price;
            line.discount_details = DiscountDetails::bundle(
                bundle.discount_percentage,
                bundle.offer_id.as_ref().map(|id| id.as_str().to_string()),
            );
        }
    }
    line
}

/// In-memory backend.
///
/// Calls can be made to fail, or held open until [`release`](Self::release)
/// so tests can observe the optimistic state mid-flight.
#[derive(Default)]
pub struct FakeStore {
    catalog: Mutex<HashMap<ProductId, ProductSummary>>,
    cart: Mutex<Vec<CartLine>>,
    favorites: Mutex<Vec<ProductId>>,
    orders: Mutex<Vec<Order>>,
    customer_carts: Mutex<HashMap<CustomerId, Vec<CartLine>>>,
    calls: Mutex<Vec<&'static str>>,
    failing: AtomicBool,
    adds_before_failure: Mutex<Option<usize>>,
    held: AtomicBool,
    gate: Notify,
}

impl FakeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register products the backend can price.
    pub fn stock(&self, products: impl IntoIterator<Item = ProductSummary>) {
        let mut catalog = lock(&self.catalog);
        for product in products {
            catalog.insert(product.id.clone(), product);
        }
    }

    /// Replace the server-side cart.
    pub fn seed_cart(&self, lines: Vec<CartLine>) {
        *lock(&self.cart) = lines;
    }

    pub fn seed_customer_cart(&self, customer_id: CustomerId, lines: Vec<CartLine>) {
        lock(&self.customer_carts).insert(customer_id, lines);
    }

    pub fn seed_favorites(&self, product_ids: impl IntoIterator<Item = ProductId>) {
        *lock(&self.favorites) = product_ids.into_iter().collect();
    }

    pub fn seed_orders(&self, orders: Vec<Order>) {
        *lock(&self.orders) = orders;
    }

    /// The server-side cart.
    #[must_use]
    pub fn cart(&self) -> Vec<CartLine> {
        lock(&self.cart).clone()
    }

    /// Make every call fail with a 503.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Let `count` more `cart_add` calls succeed, then fail the rest.
    pub fn fail_adds_after(&self, count: usize) {
        *lock(&self.adds_before_failure) = Some(count);
    }

    /// Hold every call open until [`release`](Self::release).
    pub fn hold(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    /// Let one held call proceed.
    pub fn release(&self) {
        self.gate.notify_one();
    }

    /// Names of the endpoints called so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<&'static str> {
        lock(&self.calls).clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Yield until at least `count` calls have been made.
    pub async fn wait_for_calls(&self, count: usize) {
        while self.call_count() < count {
            tokio::task::yield_now().await;
        }
    }

    async fn enter(&self, call: &'static str) -> Result<(), ApiError> {
        lock(&self.calls).push(call);
        if self.held.load(Ordering::SeqCst) {
            self.gate.notified().await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: 503,
                message: "Service unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn price_line(&self, request: &CartAddRequest) -> Result<CartLine, ApiError> {
        let product = lock(&self.catalog)
            .get(&request.product_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

        let (final_unit_price, discount_details) = match request.bundle_discount_percentage {
            Some(pct) if pct > Decimal::ZERO => (
                apply_percentage_discount(product.price, pct)
                    .map_err(|e| ApiError::InvalidRequest(e.to_string()))?,
                DiscountDetails::bundle(
                    pct,
                    request
                        .bundle_offer_id
                        .as_ref()
                        .map(|id| id.as_str().to_string()),
                ),
            ),
            _ => (product.price, DiscountDetails::default()),
        };

        Ok(CartLine {
            product_id: product.id.clone(),
            quantity: request.quantity,
            bundle_group_id: request.bundle_group_id.clone(),
            original_unit_price: product.price,
            final_unit_price,
            discount_details,
            product,
        })
    }
}

#[async_trait]
impl StoreApi for FakeStore {
    async fn cart_get(&self) -> Result<Vec<CartLine>, ApiError> {
        self.enter("cart_get").await?;
        Ok(self.cart())
    }

    async fn cart_add(&self, request: &CartAddRequest) -> Result<CartLine, ApiError> {
        self.enter("cart_add").await?;
        {
            let mut remaining = lock(&self.adds_before_failure);
            match remaining.as_mut() {
                Some(0) => {
                    return Err(ApiError::Status {
                        status: 500,
                        message: "Internal error".to_string(),
                    });
                }
                Some(n) => *n -= 1,
                None => {}
            }
        }

        let line = self.price_line(request)?;
        let mut cart = lock(&self.cart);
        // Same product in the same group (or both standalone) merges.
        match cart.iter_mut().find(|l| {
            l.product_id == line.product_id && l.bundle_group_id == line.bundle_group_id
        }) {
            Some(existing) => existing.quantity += line.quantity,
            None => cart.push(line.clone()),
        }
        Ok(line)
    }

    async fn cart_update(&self, product_id: &ProductId, quantity: i64) -> Result<(), ApiError> {
        self.enter("cart_update").await?;
        let mut cart = lock(&self.cart);
        if quantity <= 0 {
            cart.retain(|l| &l.product_id != product_id);
        } else {
            let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
            for line in cart.iter_mut().filter(|l| &l.product_id == product_id) {
                line.quantity = quantity;
            }
        }
        Ok(())
    }

    async fn cart_remove(&self, product_id: &ProductId) -> Result<(), ApiError> {
        self.enter("cart_remove").await?;
        lock(&self.cart).retain(|l| &l.product_id != product_id);
        Ok(())
    }

    async fn cart_clear(&self) -> Result<(), ApiError> {
        self.enter("cart_clear").await?;
        lock(&self.cart).clear();
        Ok(())
    }

    async fn cart_void_bundle(&self, bundle_group_id: &BundleGroupId) -> Result<(), ApiError> {
        self.enter("cart_void_bundle").await?;
        lock(&self.cart)
            .iter_mut()
            .filter(|l| l.bundle_group_id.as_ref() == Some(bundle_group_id))
            .for_each(CartLine::void_bundle);
        Ok(())
    }

    async fn favorites_get_all(&self) -> Result<Vec<FavoriteEntry>, ApiError> {
        self.enter("favorites_get_all").await?;
        let catalog = lock(&self.catalog);
        Ok(lock(&self.favorites)
            .iter()
            .filter_map(|id| catalog.get(id).cloned())
            .map(FavoriteEntry::for_product)
            .collect())
    }

    async fn favorites_toggle(&self, product_id: &ProductId) -> Result<bool, ApiError> {
        self.enter("favorites_toggle").await?;
        let mut favorites = lock(&self.favorites);
        if favorites.contains(product_id) {
            favorites.retain(|id| id != product_id);
            Ok(false)
        } else {
            favorites.push(product_id.clone());
            Ok(true)
        }
    }

    async fn favorites_check(&self, product_id: &ProductId) -> Result<bool, ApiError> {
        self.enter("favorites_check").await?;
        Ok(lock(&self.favorites).contains(product_id))
    }

    async fn orders_get_all(&self) -> Result<Vec<Order>, ApiError> {
        self.enter("orders_get_all").await?;
        Ok(lock(&self.orders).clone())
    }

    async fn customer_cart(&self, customer_id: &CustomerId) -> Result<Vec<CartLine>, ApiError> {
        self.enter("customer_cart").await?;
        lock(&self.customer_carts)
            .get(customer_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound("Customer not found".to_string()))
    }

    async fn customer_favorites(
        &self,
        _customer_id: &CustomerId,
    ) -> Result<Vec<FavoriteEntry>, ApiError> {
        self.enter("customer_favorites").await?;
        Ok(Vec::new())
    }

    async fn customer_orders(&self, _customer_id: &CustomerId) -> Result<Vec<Order>, ApiError> {
        self.enter("customer_orders").await?;
        Ok(Vec::new())
    }
}

/// Notifier that records every notice.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<DuplicateNotice>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn notices(&self) -> Vec<DuplicateNotice> {
        lock(&self.notices).clone()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        lock(&self.notices).len()
    }
}

impl DuplicateNotifier for RecordingNotifier {
    fn notify(&self, notice: &DuplicateNotice) {
        lock(&self.notices).push(notice.clone());
    }
}

/// Configuration for tests. The API section is never used to connect.
///
/// # Panics
///
/// Never; the base URL is a valid literal.
#[must_use]
pub fn test_config(locale: Locale) -> StorefrontConfig {
    StorefrontConfig {
        api: ApiConfig {
            base_url: "http://127.0.0.1:9"
                .parse()
                .unwrap_or_else(|e| panic!("static URL: {e}")),
            session_token: SecretString::from("3f9c2a7e-81b4-4d6f-9e05-c2a1b7d84f36"),
            request_timeout: Duration::from_secs(2),
        },
        cache: CacheConfig::default(),
        locale,
        shipping_cost: Decimal::new(150, 0),
        sentry_dsn: None,
    }
}

/// A storefront wired to a [`FakeStore`] and a [`RecordingNotifier`].
pub struct TestContext {
    pub store: Arc<FakeStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub storefront: Storefront,
}

impl TestContext {
    #[must_use]
    pub fn new(store: FakeStore) -> Self {
        Self::with_locale(store, Locale::En)
    }

    #[must_use]
    pub fn with_locale(store: FakeStore, locale: Locale) -> Self {
        Self::with_config(store, test_config(locale))
    }

    #[must_use]
    pub fn with_config(store: FakeStore, config: StorefrontConfig) -> Self {
        let store = Arc::new(store);
        let notifier = Arc::new(RecordingNotifier::default());
        let storefront = Storefront::with_client(
            config,
            Arc::clone(&store) as Arc<dyn StoreApi>,
            Arc::clone(&notifier) as Arc<dyn DuplicateNotifier>,
        );
        Self {
            store,
            notifier,
            storefront,
        }
    }

    /// Load the cart into the cache, as the cart screen does on open.
    ///
    /// # Panics
    ///
    /// Panics if the fake backend is set to fail.
    pub async fn load_cart(&self) -> Vec<CartLine> {
        self.storefront
            .queries()
            .cart()
            .await
            .unwrap_or_else(|e| panic!("initial cart load failed: {e}"))
    }
}
