//! Read path: cached cart, favorites and orders.
//!
//! Reads are stale-while-revalidate. A cached snapshot is returned at once;
//! if it is stale, a background task refetches it. Only a cold read (nothing
//! cached) waits for the network.

use std::sync::Arc;
use std::time::Duration;

use alghazaly_core::{
    CartLine, CartTotals, CustomerId, FavoriteEntry, Order, OrderSummary, ProductId,
};
use moka::sync::Cache;
use rust_decimal::Decimal;
use tracing::{Instrument, debug, info_span, instrument, trace, warn};

use crate::api::{ApiError, StoreApi};
use crate::cache::{CacheValue, Cacheable, LocalCache, ResourceKey, ResourceKind};

/// Upper bound on how long a refetch is considered in flight. A task that
/// panics is forgotten after this long instead of blocking refetches forever.
const IN_FLIGHT_TTL: Duration = Duration::from_secs(60);

/// Fetch the backend's current value for `key`.
async fn fetch(client: &dyn StoreApi, key: &ResourceKey) -> Result<CacheValue, ApiError> {
    match key {
        ResourceKey::Cart => client.cart_get().await.map(CacheValue::Cart),
        ResourceKey::Favorites => client.favorites_get_all().await.map(CacheValue::Favorites),
        ResourceKey::Orders => client.orders_get_all().await.map(CacheValue::Orders),
        ResourceKey::Customer { customer_id, kind } => match kind {
            ResourceKind::Cart => client.customer_cart(customer_id).await.map(CacheValue::Cart),
            ResourceKind::Favorites => client
                .customer_favorites(customer_id)
                .await
                .map(CacheValue::Favorites),
            ResourceKind::Orders => client
                .customer_orders(customer_id)
                .await
                .map(CacheValue::Orders),
        },
    }
}

/// Cached reads against the backend. Cheap to clone.
#[derive(Clone)]
pub struct Queries {
    client: Arc<dyn StoreApi>,
    cache: LocalCache,
    in_flight: Cache<ResourceKey, ()>,
    shipping_cost: Decimal,
}

impl Queries {
    #[must_use]
    pub fn new(client: Arc<dyn StoreApi>, cache: LocalCache, shipping_cost: Decimal) -> Self {
        let in_flight = Cache::builder().time_to_live(IN_FLIGHT_TTL).build();
        Self {
            client,
            cache,
            in_flight,
            shipping_cost,
        }
    }

    /// The signed-in customer's cart.
    ///
    /// # Errors
    ///
    /// Returns an error only on a cold read whose fetch fails.
    pub async fn cart(&self) -> Result<Vec<CartLine>, ApiError> {
        self.read(ResourceKey::Cart).await
    }

    /// The signed-in customer's favorites.
    ///
    /// # Errors
    ///
    /// Returns an error only on a cold read whose fetch fails.
    pub async fn favorites(&self) -> Result<Vec<FavoriteEntry>, ApiError> {
        self.read(ResourceKey::Favorites).await
    }

    /// The signed-in customer's orders.
    ///
    /// # Errors
    ///
    /// Returns an error only on a cold read whose fetch fails.
    pub async fn orders(&self) -> Result<Vec<Order>, ApiError> {
        self.read(ResourceKey::Orders).await
    }

    /// Staff view of another customer's cart.
    ///
    /// # Errors
    ///
    /// Returns an error only on a cold read whose fetch fails.
    pub async fn customer_cart(&self, customer_id: &CustomerId) -> Result<Vec<CartLine>, ApiError> {
        self.read(ResourceKey::customer(customer_id.clone(), ResourceKind::Cart))
            .await
    }

    /// Staff view of another customer's favorites.
    ///
    /// # Errors
    ///
    /// Returns an error only on a cold read whose fetch fails.
    pub async fn customer_favorites(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Vec<FavoriteEntry>, ApiError> {
        self.read(ResourceKey::customer(
            customer_id.clone(),
            ResourceKind::Favorites,
        ))
        .await
    }

    /// Staff view of another customer's orders.
    ///
    /// # Errors
    ///
    /// Returns an error only on a cold read whose fetch fails.
    pub async fn customer_orders(&self, customer_id: &CustomerId) -> Result<Vec<Order>, ApiError> {
        self.read(ResourceKey::customer(customer_id.clone(), ResourceKind::Orders))
            .await
    }

    /// Whether a product is a favorite. Best effort: any failure reads as
    /// `false`.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn is_favorite(&self, product_id: &ProductId) -> bool {
        if let Some(snapshot) = self.cache.get::<FavoriteEntry>(&ResourceKey::Favorites) {
            if snapshot.is_stale() {
                self.revalidate(ResourceKey::Favorites);
            }
            return snapshot
                .items()
                .iter()
                .any(|entry| &entry.product_id == product_id);
        }

        match self.client.favorites_check(product_id).await {
            Ok(is_favorite) => is_favorite,
            Err(e) => {
                debug!(error = %e, "Favorite status check failed");
                false
            }
        }
    }

    /// Totals over the current cart.
    ///
    /// # Errors
    ///
    /// Returns an error only if the cart is not cached and cannot be fetched.
    pub async fn cart_totals(&self) -> Result<CartTotals, ApiError> {
        Ok(CartTotals::from_lines(&self.cart().await?))
    }

    /// Checkout summary of the current cart, including shipping.
    ///
    /// # Errors
    ///
    /// Returns an error only if the cart is not cached and cannot be fetched.
    pub async fn order_summary(&self) -> Result<OrderSummary, ApiError> {
        Ok(OrderSummary::new(&self.cart().await?, self.shipping_cost))
    }

    /// Refetch `key` now, in the foreground.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; the cached snapshot is left untouched.
    #[instrument(skip(self, key), fields(resource_key = %key))]
    pub async fn refresh(&self, key: &ResourceKey) -> Result<(), ApiError> {
        let version = self.cache.version(key);
        let value = fetch(self.client.as_ref(), key).await?;
        self.cache.set_value_if_version(key, version, value);
        Ok(())
    }

    #[instrument(skip(self, key), fields(resource_key = %key))]
    async fn read<T: Cacheable>(&self, key: ResourceKey) -> Result<Vec<T>, ApiError> {
        debug_assert_eq!(key.kind(), T::KIND);

        if let Some(snapshot) = self.cache.get::<T>(&key) {
            if snapshot.is_stale() {
                self.revalidate(key);
            } else {
                trace!("Cache hit");
            }
            return Ok(snapshot.data);
        }

        let version = self.cache.version(&key);
        let value = fetch(self.client.as_ref(), &key).await?;
        let data = T::from_value(&value).map(<[T]>::to_vec).unwrap_or_default();

        if !self.cache.set_value_if_version(&key, version, value)
            && let Some(current) = self.cache.get::<T>(&key)
        {
            // A mutation wrote while we were fetching; its view is newer.
            return Ok(current.data);
        }
        Ok(data)
    }

    /// Refetch `key` in the background unless a refetch is already running.
    fn revalidate(&self, key: ResourceKey) {
        let entry = self.in_flight.entry(key.clone()).or_insert(());
        if !entry.is_fresh() {
            trace!(resource_key = %key, "Refetch already in flight");
            return;
        }

        let version = self.cache.version(&key);
        let client = Arc::clone(&self.client);
        let cache = self.cache.clone();
        let in_flight = self.in_flight.clone();
        let span = info_span!("revalidate", resource_key = %key);

        tokio::spawn(
            async move {
                match fetch(client.as_ref(), &key).await {
                    Ok(value) => {
                        cache.set_value_if_version(&key, version, value);
                    }
                    Err(e) => {
                        warn!(error = %e, "Background refetch failed, keeping stale data");
                    }
                }
                in_flight.invalidate(&key);
            }
            .instrument(span),
        );
    }
}

impl std::fmt::Debug for Queries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queries")
            .field("shipping_cost", &self.shipping_cost)
            .finish_non_exhaustive()
    }
}
