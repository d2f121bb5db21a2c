//! Cart mutations.

use alghazaly_core::{
    BundleGroupId, CartLine, DiscountDetails, ProductId, ProductSummary, apply_percentage_discount,
};
use tracing::{instrument, warn};

use super::{MutationCoordinator, MutationError, MutationKind, MutationOutcome, PendingMutation};
use crate::api::{BundleSelection, CartAddRequest};
use crate::cache::ResourceKey;

/// The line a successful add is expected to produce.
fn optimistic_line(product: &ProductSummary, quantity: u32) -> CartLine {
    CartLine {
        product_id: product.id.clone(),
        quantity,
        bundle_group_id: None,
        original_unit_price: product.price,
        final_unit_price: product.price,
        discount_details: DiscountDetails::default(),
        product: product.clone(),
    }
}

impl MutationCoordinator {
    /// Add a product as a standalone line.
    ///
    /// A `quantity` of zero is sent as one, matching the backend default.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError::Transport`] if the backend call fails; the
    /// cart is rolled back first.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add(
        &self,
        product: &ProductSummary,
        quantity: u32,
    ) -> Result<MutationOutcome<CartLine>, MutationError> {
        let quantity = quantity.max(1);
        let mut pending = PendingMutation::begin(MutationKind::Add, ResourceKey::Cart);
        let previous = self.cache.get::<CartLine>(&ResourceKey::Cart);

        if let Err(rejection) = self.guard.check(previous.as_ref(), &product.id) {
            pending.reject();
            self.guard.notify_duplicate(self.locale);
            return Ok(MutationOutcome::Rejected(rejection));
        }

        let mut lines = previous.as_ref().map(|s| s.data.clone()).unwrap_or_default();
        lines.push(optimistic_line(product, quantity));
        pending.apply(&self.cache, previous, lines);

        let request = CartAddRequest::new(product.clone(), quantity);
        match self.client.cart_add(&request).await {
            Ok(line) => {
                pending.confirm(&self.cache);
                Ok(MutationOutcome::Confirmed(line))
            }
            Err(e) => {
                pending.roll_back(&self.cache);
                Err(MutationError::transport(MutationKind::Add)(e))
            }
        }
    }

    /// Add several products as one bundle with a shared discount.
    ///
    /// If any product is already in the cart, or is listed twice, the whole
    /// bundle is rejected and the user is notified once. The backend has no
    /// batch endpoint, so lines are added one by one; if one fails, the cart
    /// is rolled back and also marked stale, since earlier lines may already
    /// exist server-side.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError::Price`] for a discount outside 0-100% before
    /// anything is written, or [`MutationError::Transport`] if a backend
    /// call fails. A duplicate is reported as
    /// [`MutationOutcome::Rejected`] even when the discount is also invalid.
    #[instrument(skip(self, products, bundle), fields(bundle_group_id = %bundle.group_id))]
    pub async fn add_bundle(
        &self,
        products: &[ProductSummary],
        bundle: &BundleSelection,
    ) -> Result<MutationOutcome<Vec<CartLine>>, MutationError> {
        if products.is_empty() {
            return Ok(MutationOutcome::Confirmed(Vec::new()));
        }

        let mut pending = PendingMutation::begin(MutationKind::AddBundle, ResourceKey::Cart);
        let previous = self.cache.get::<CartLine>(&ResourceKey::Cart);

        if let Err(rejection) = self
            .guard
            .check_all(previous.as_ref(), products.iter().map(|p| &p.id))
        {
            pending.reject();
            self.guard.notify_duplicate(self.locale);
            return Ok(MutationOutcome::Rejected(rejection));
        }

        let discount = DiscountDetails::bundle(
            bundle.discount_percentage,
            bundle.offer_id.as_ref().map(|id| id.as_str().to_string()),
        );
        let bundled = products
            .iter()
            .map(|product| -> Result<CartLine, MutationError> {
                let final_unit_price =
                    apply_percentage_discount(product.price, bundle.discount_percentage)?;
                Ok(CartLine {
                    bundle_group_id: Some(bundle.group_id.clone()),
                    final_unit_price,
                    discount_details: discount.clone(),
                    ..optimistic_line(product, 1)
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut lines = previous.as_ref().map(|s| s.data.clone()).unwrap_or_default();
        lines.extend(bundled);
        pending.apply(&self.cache, previous, lines);

        let mut confirmed = Vec::with_capacity(products.len());
        for product in products {
            let request = CartAddRequest::new(product.clone(), 1).in_bundle(bundle);
            match self.client.cart_add(&request).await {
                Ok(line) => confirmed.push(line),
                Err(e) => {
                    if !confirmed.is_empty() {
                        warn!(
                            added = confirmed.len(),
                            "Bundle partially added before failure"
                        );
                    }
                    pending.roll_back(&self.cache);
                    self.cache.invalidate(&ResourceKey::Cart);
                    return Err(MutationError::transport(MutationKind::AddBundle)(e));
                }
            }
        }

        pending.confirm(&self.cache);
        Ok(MutationOutcome::Confirmed(confirmed))
    }

    /// Set a line's quantity. Zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError::QuantityOutOfRange`] for a quantity above
    /// `u32::MAX` before anything is written, or [`MutationError::Transport`]
    /// if the backend call fails; the cart is rolled back first.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_quantity(
        &self,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<(), MutationError> {
        let line_quantity = if quantity <= 0 {
            None
        } else {
            Some(
                u32::try_from(quantity)
                    .map_err(|_| MutationError::QuantityOutOfRange(quantity))?,
            )
        };

        let mut pending = PendingMutation::begin(MutationKind::UpdateQuantity, ResourceKey::Cart);
        let previous = self.cache.get::<CartLine>(&ResourceKey::Cart);

        let mut lines = previous.as_ref().map(|s| s.data.clone()).unwrap_or_default();
        match line_quantity {
            None => lines.retain(|line| &line.product_id != product_id),
            Some(quantity) => {
                for line in lines.iter_mut().filter(|l| &l.product_id == product_id) {
                    line.quantity = quantity;
                }
            }
        }
        pending.apply(&self.cache, previous, lines);

        self.settle(
            pending,
            MutationKind::UpdateQuantity,
            self.client.cart_update(product_id, quantity).await,
        )
    }

    /// Remove a product's line.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError::Transport`] if the backend call fails; the
    /// cart is rolled back first.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove(&self, product_id: &ProductId) -> Result<(), MutationError> {
        let mut pending = PendingMutation::begin(MutationKind::Remove, ResourceKey::Cart);
        let previous = self.cache.get::<CartLine>(&ResourceKey::Cart);

        let mut lines = previous.as_ref().map(|s| s.data.clone()).unwrap_or_default();
        lines.retain(|line| &line.product_id != product_id);
        pending.apply(&self.cache, previous, lines);

        self.settle(
            pending,
            MutationKind::Remove,
            self.client.cart_remove(product_id).await,
        )
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError::Transport`] if the backend call fails; the
    /// cart is rolled back first.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<(), MutationError> {
        let mut pending = PendingMutation::begin(MutationKind::Clear, ResourceKey::Cart);
        let previous = self.cache.get::<CartLine>(&ResourceKey::Cart);
        pending.apply(&self.cache, previous, Vec::new());

        self.settle(pending, MutationKind::Clear, self.client.cart_clear().await)
    }

    /// Dissolve a bundle: its lines stay in the cart at their original price.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError::Transport`] if the backend call fails; the
    /// cart is rolled back first.
    #[instrument(skip(self), fields(bundle_group_id = %bundle_group_id))]
    pub async fn void_bundle(&self, bundle_group_id: &BundleGroupId) -> Result<(), MutationError> {
        let mut pending = PendingMutation::begin(MutationKind::VoidBundle, ResourceKey::Cart);
        let previous = self.cache.get::<CartLine>(&ResourceKey::Cart);

        let mut lines = previous.as_ref().map(|s| s.data.clone()).unwrap_or_default();
        lines
            .iter_mut()
            .filter(|line| line.bundle_group_id.as_ref() == Some(bundle_group_id))
            .for_each(CartLine::void_bundle);
        pending.apply(&self.cache, previous, lines);

        self.settle(
            pending,
            MutationKind::VoidBundle,
            self.client.cart_void_bundle(bundle_group_id).await,
        )
    }

    fn settle(
        &self,
        pending: PendingMutation<CartLine>,
        kind: MutationKind,
        result: Result<(), crate::api::ApiError>,
    ) -> Result<(), MutationError> {
        match result {
            Ok(()) => {
                pending.confirm(&self.cache);
                Ok(())
            }
            Err(e) => {
                pending.roll_back(&self.cache);
                Err(MutationError::transport(kind)(e))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    use alghazaly_core::{BundleOfferId, CartLine, DiscountType, Locale};
    use rust_decimal::Decimal;

    use super::*;
    use crate::cache::LocalCache;
    use crate::config::CacheConfig;
    use crate::guard::DuplicateGuard;
    use crate::testing::{CountingNotifier, FakeApi, line, product};

    struct Harness {
        api: Arc<FakeApi>,
        notifier: Arc<CountingNotifier>,
        cache: LocalCache,
        coordinator: MutationCoordinator,
    }

    fn harness(api: FakeApi, lines: Option<Vec<CartLine>>) -> Harness {
        let (api, client) = api.shared();
        let notifier = Arc::new(CountingNotifier::default());
        let cache = LocalCache::new(&CacheConfig::default());
        if let Some(lines) = lines {
            cache.set(&ResourceKey::Cart, lines);
        }
        let coordinator = MutationCoordinator::new(
            client,
            cache.clone(),
            DuplicateGuard::new(notifier.clone()),
            Locale::En,
        );
        Harness {
            api,
            notifier,
            cache,
            coordinator,
        }
    }

    fn cart(cache: &LocalCache) -> Vec<CartLine> {
        cache.get::<CartLine>(&ResourceKey::Cart).unwrap().data
    }

    fn bundle(pct: i64) -> BundleSelection {
        BundleSelection {
            group_id: BundleGroupId::new("g1"),
            offer_id: Some(BundleOfferId::new("offer-1")),
            discount_percentage: Decimal::new(pct, 0),
        }
    }

    #[tokio::test]
    async fn test_add_to_empty_cart() {
        let h = harness(FakeApi::default(), None);

        let outcome = h.coordinator.add(&product("p1", 250), 2).await.unwrap();

        assert!(outcome.is_confirmed());
        let snap = h.cache.get::<CartLine>(&ResourceKey::Cart).unwrap();
        assert!(snap.invalidated);
        assert_eq!(snap.data.len(), 1);
        assert_eq!(snap.data[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_duplicate_add_is_rejected_without_network() {
        let h = harness(FakeApi::default(), Some(vec![line("p1", 1, Some("g1"))]));
        let before = h.cache.get::<CartLine>(&ResourceKey::Cart);

        let outcome = h.coordinator.add(&product("p1", 100), 1).await.unwrap();

        assert!(outcome.is_rejected());
        assert_eq!(h.api.call_count(), 0);
        assert_eq!(h.notifier.0.load(Ordering::SeqCst), 1);
        assert_eq!(h.cache.get::<CartLine>(&ResourceKey::Cart), before);
    }

    #[tokio::test]
    async fn test_update_quantity_is_visible_before_remote_resolves() {
        let h = harness(FakeApi::gated(), Some(vec![line("p1", 1, None)]));

        let coordinator = h.coordinator.clone();
        let task = tokio::spawn(async move {
            coordinator
                .update_quantity(&ProductId::new("p1"), 3)
                .await
        });

        h.api.wait_for_call().await;
        assert_eq!(cart(&h.cache)[0].quantity, 3);

        h.api.release();
        task.await.unwrap().unwrap();
        assert!(h.cache.get::<CartLine>(&ResourceKey::Cart).unwrap().invalidated);
    }

    #[tokio::test]
    async fn test_non_positive_quantity_removes_line() {
        let h = harness(
            FakeApi::default(),
            Some(vec![line("p1", 2, None), line("p2", 1, None)]),
        );

        h.coordinator
            .update_quantity(&ProductId::new("p1"), 0)
            .await
            .unwrap();

        let lines = cart(&h.cache);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].product_id, ProductId::new("p2"));
    }

    #[tokio::test]
    async fn test_oversized_quantity_is_rejected_before_writing() {
        let h = harness(FakeApi::default(), Some(vec![line("p1", 2, None)]));
        let before = h.cache.get::<CartLine>(&ResourceKey::Cart);

        let err = h
            .coordinator
            .update_quantity(&ProductId::new("p1"), 5_000_000_000)
            .await
            .unwrap_err();

        assert!(matches!(err, MutationError::QuantityOutOfRange(5_000_000_000)));
        assert_eq!(h.cache.get::<CartLine>(&ResourceKey::Cart), before);
        assert_eq!(h.api.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_remove_rolls_back() {
        let h = harness(FakeApi::failing(), Some(vec![line("p1", 1, None)]));
        let before = h.cache.get::<CartLine>(&ResourceKey::Cart);

        let err = h.coordinator.remove(&ProductId::new("p1")).await.unwrap_err();

        assert!(err.is_recoverable());
        assert_eq!(h.cache.get::<CartLine>(&ResourceKey::Cart), before);
    }

    #[tokio::test]
    async fn test_failed_add_to_uncached_cart_leaves_it_uncached() {
        let h = harness(FakeApi::failing(), None);

        assert!(h.coordinator.add(&product("p1", 100), 1).await.is_err());
        assert!(h.cache.get::<CartLine>(&ResourceKey::Cart).is_none());
    }

    #[tokio::test]
    async fn test_clear_empties_cart() {
        let h = harness(FakeApi::default(), Some(vec![line("p1", 1, None)]));
        h.coordinator.clear().await.unwrap();
        assert!(cart(&h.cache).is_empty());
    }

    #[tokio::test]
    async fn test_add_bundle_prices_lines_optimistically() {
        let h = harness(FakeApi::gated(), Some(Vec::new()));

        let coordinator = h.coordinator.clone();
        let task = tokio::spawn(async move {
            coordinator
                .add_bundle(&[product("p1", 200), product("p2", 99)], &bundle(15))
                .await
        });

        h.api.wait_for_call().await;
        let lines = cart(&h.cache);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].final_unit_price, Decimal::new(170, 0));
        assert_eq!(lines[1].final_unit_price, Decimal::new(8415, 2));
        assert_eq!(lines[0].discount_details.discount_type, DiscountType::Bundle);
        assert!(lines.iter().all(CartLine::is_bundled));

        h.api.release();
        h.api.wait_for_calls(2).await;
        h.api.release();
        let outcome = task.await.unwrap().unwrap();
        assert!(matches!(outcome, MutationOutcome::Confirmed(ref l) if l.len() == 2));
    }

    #[tokio::test]
    async fn test_add_bundle_with_one_duplicate_notifies_once() {
        let h = harness(FakeApi::default(), Some(vec![line("p2", 1, None)]));

        let outcome = h
            .coordinator
            .add_bundle(
                &[product("p1", 100), product("p2", 100), product("p3", 100)],
                &bundle(10),
            )
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            MutationOutcome::Rejected(ref r) if r.product_id == ProductId::new("p2")
        ));
        assert_eq!(h.notifier.0.load(Ordering::SeqCst), 1);
        assert_eq!(h.api.call_count(), 0);
    }

    #[tokio::test]
    async fn test_add_bundle_rejects_bad_percentage() {
        let h = harness(FakeApi::default(), None);
        let err = h
            .coordinator
            .add_bundle(&[product("p1", 100)], &bundle(120))
            .await
            .unwrap_err();
        assert!(matches!(err, MutationError::Price(_)));
        assert!(h.cache.get::<CartLine>(&ResourceKey::Cart).is_none());
    }

    #[tokio::test]
    async fn test_void_bundle_restores_original_prices() {
        let mut bundled = line("p1", 1, Some("g1"));
        bundled.final_unit_price = Decimal::new(85, 0);
        let h = harness(
            FakeApi::default(),
            Some(vec![bundled, line("p2", 1, Some("g2"))]),
        );

        h.coordinator
            .void_bundle(&BundleGroupId::new("g1"))
            .await
            .unwrap();

        let lines = cart(&h.cache);
        assert_eq!(lines[0].final_unit_price, Decimal::new(100, 0));
        assert!(!lines[0].is_bundled());
        assert!(lines[1].is_bundled());
    }

    #[tokio::test]
    async fn test_failed_void_bundle_rolls_back() {
        let h = harness(FakeApi::failing(), Some(vec![line("p1", 1, Some("g1"))]));
        let before = h.cache.get::<CartLine>(&ResourceKey::Cart);

        assert!(
            h.coordinator
                .void_bundle(&BundleGroupId::new("g1"))
                .await
                .is_err()
        );
        assert_eq!(h.cache.get::<CartLine>(&ResourceKey::Cart), before);
    }
}
