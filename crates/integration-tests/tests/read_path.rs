//! Cached reads: cold fetches, stale-while-revalidate and derived totals.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use alghazaly_core::{CartLine, CustomerId, Order, OrderId, OrderStatus, ProductId};
use alghazaly_integration_tests::{FakeStore, TestContext, bundle, line, product};
use alghazaly_storefront::api::ApiError;
use alghazaly_storefront::cache::ResourceKey;
use rust_decimal::Decimal;

/// Wait for background refetches to land.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

fn order(id: &str) -> Order {
    Order {
        id: OrderId::new(id),
        order_number: format!("ORD-20250101120000-{id}"),
        status: OrderStatus::Preparing,
        subtotal: Some(Decimal::new(500, 0)),
        total_discount: Some(Decimal::ZERO),
        shipping_cost: Some(Decimal::new(150, 0)),
        total: Some(Decimal::new(650, 0)),
        created_at: None,
        items: Vec::new(),
    }
}

#[tokio::test]
async fn test_fresh_cache_serves_without_network() {
    let store = FakeStore::new();
    store.seed_cart(vec![line(&product("P1", 100), 1, None)]);
    let ctx = TestContext::new(store);

    let first = ctx.storefront.queries().cart().await.unwrap();
    let second = ctx.storefront.queries().cart().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(ctx.store.calls(), vec!["cart_get"]);
}

#[tokio::test]
async fn test_stale_read_serves_cached_then_refetches() {
    let store = FakeStore::new();
    store.seed_cart(vec![line(&product("P1", 100), 1, None)]);
    let ctx = TestContext::new(store);
    ctx.load_cart().await;

    ctx.store.seed_cart(vec![
        line(&product("P1", 100), 1, None),
        line(&product("P2", 100), 1, None),
    ]);
    ctx.storefront.cache().invalidate(&ResourceKey::Cart);

    let stale = ctx.storefront.queries().cart().await.unwrap();
    assert_eq!(stale.len(), 1);

    ctx.store.wait_for_calls(2).await;
    settle().await;

    let snapshot = ctx
        .storefront
        .cache()
        .get::<CartLine>(&ResourceKey::Cart)
        .unwrap();
    assert_eq!(snapshot.data.len(), 2);
    assert!(!snapshot.invalidated);
}

#[tokio::test]
async fn test_concurrent_stale_reads_refetch_once() {
    let ctx = TestContext::new(FakeStore::new());
    ctx.load_cart().await;
    ctx.storefront.cache().invalidate(&ResourceKey::Cart);

    ctx.store.hold();
    ctx.storefront.queries().cart().await.unwrap();
    ctx.storefront.queries().cart().await.unwrap();
    ctx.store.wait_for_calls(2).await;
    settle().await;

    assert_eq!(ctx.store.call_count(), 2);
    ctx.store.release();
}

#[tokio::test]
async fn test_refetch_does_not_overwrite_newer_write() {
    let store = FakeStore::new();
    store.seed_cart(vec![line(&product("P1", 100), 1, None)]);
    let ctx = TestContext::new(store);
    ctx.load_cart().await;
    ctx.storefront.cache().invalidate(&ResourceKey::Cart);

    ctx.store.hold();
    ctx.storefront.queries().cart().await.unwrap();
    ctx.store.wait_for_calls(2).await;

    // A mutation lands while the refetch is out.
    let newer = vec![line(&product("P9", 100), 5, None)];
    ctx.storefront.cache().set(&ResourceKey::Cart, newer.clone());

    ctx.store.release();
    settle().await;

    let snapshot = ctx
        .storefront
        .cache()
        .get::<CartLine>(&ResourceKey::Cart)
        .unwrap();
    assert_eq!(snapshot.data, newer);
}

#[tokio::test]
async fn test_failed_refetch_keeps_stale_data() {
    let store = FakeStore::new();
    store.seed_cart(vec![line(&product("P1", 100), 1, None)]);
    let ctx = TestContext::new(store);
    let loaded = ctx.load_cart().await;
    ctx.storefront.cache().invalidate(&ResourceKey::Cart);

    ctx.store.set_failing(true);
    assert_eq!(ctx.storefront.queries().cart().await.unwrap(), loaded);
    ctx.store.wait_for_calls(2).await;
    settle().await;

    let snapshot = ctx
        .storefront
        .cache()
        .get::<CartLine>(&ResourceKey::Cart)
        .unwrap();
    assert_eq!(snapshot.data, loaded);
    assert!(snapshot.invalidated);
}

#[tokio::test]
async fn test_cold_read_failure_surfaces_error() {
    let store = FakeStore::new();
    store.set_failing(true);
    let ctx = TestContext::new(store);

    let err = ctx.storefront.queries().cart().await.unwrap_err();

    assert!(matches!(err, ApiError::Status { status: 503, .. }));
    assert!(err.is_transient());
    assert!(
        ctx.storefront
            .cache()
            .get::<CartLine>(&ResourceKey::Cart)
            .is_none()
    );
}

#[tokio::test]
async fn test_order_summary_matches_backend_arithmetic() {
    let store = FakeStore::new();
    let b1 = bundle("B1", 10);
    store.seed_cart(vec![
        line(&product("P1", 250), 1, Some(&b1)),
        line(&product("P2", 100), 2, None),
    ]);
    let ctx = TestContext::new(store);

    let summary = ctx.storefront.queries().order_summary().await.unwrap();

    assert_eq!(summary.totals.subtotal, Decimal::new(450, 0));
    assert_eq!(summary.totals.total_discount, Decimal::new(25, 0));
    assert_eq!(summary.totals.total, Decimal::new(425, 0));
    assert_eq!(summary.totals.item_count, 3);
    assert_eq!(summary.shipping_cost, Decimal::new(150, 0));
    assert_eq!(summary.grand_total, Decimal::new(575, 0));

    let totals = ctx.storefront.queries().cart_totals().await.unwrap();
    assert_eq!(totals, summary.totals);
    assert_eq!(ctx.store.calls(), vec!["cart_get"]);
}

#[tokio::test]
async fn test_is_favorite_uses_snapshot_when_cached() {
    let store = FakeStore::new();
    store.stock([product("P1", 100)]);
    store.seed_favorites([ProductId::new("P1")]);
    let ctx = TestContext::new(store);
    ctx.storefront.queries().favorites().await.unwrap();

    assert!(
        ctx.storefront
            .queries()
            .is_favorite(&ProductId::new("P1"))
            .await
    );
    assert!(
        !ctx.storefront
            .queries()
            .is_favorite(&ProductId::new("P2"))
            .await
    );
    assert_eq!(ctx.store.calls(), vec!["favorites_get_all"]);
}

#[tokio::test]
async fn test_is_favorite_falls_back_to_backend() {
    let store = FakeStore::new();
    store.seed_favorites([ProductId::new("P1")]);
    let ctx = TestContext::new(store);

    assert!(
        ctx.storefront
            .queries()
            .is_favorite(&ProductId::new("P1"))
            .await
    );
    assert_eq!(ctx.store.calls(), vec!["favorites_check"]);

    ctx.store.set_failing(true);
    assert!(
        !ctx.storefront
            .queries()
            .is_favorite(&ProductId::new("P1"))
            .await
    );
}

#[tokio::test]
async fn test_orders_are_cached() {
    let store = FakeStore::new();
    store.seed_orders(vec![order("A1"), order("A2")]);
    let ctx = TestContext::new(store);

    let orders = ctx.storefront.queries().orders().await.unwrap();
    ctx.storefront.queries().orders().await.unwrap();

    assert_eq!(orders.len(), 2);
    assert_eq!(ctx.store.calls(), vec!["orders_get_all"]);
}

#[tokio::test]
async fn test_customer_cart_is_cached_apart_from_own_cart() {
    let store = FakeStore::new();
    let customer = CustomerId::new("c42");
    store.seed_customer_cart(customer.clone(), vec![line(&product("P7", 300), 2, None)]);
    let ctx = TestContext::new(store);

    let theirs = ctx
        .storefront
        .queries()
        .customer_cart(&customer)
        .await
        .unwrap();
    let mine = ctx.storefront.queries().cart().await.unwrap();

    assert_eq!(theirs.len(), 1);
    assert!(mine.is_empty());
    assert_eq!(ctx.store.calls(), vec!["customer_cart", "cart_get"]);

    let err = ctx
        .storefront
        .queries()
        .customer_cart(&CustomerId::new("missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn test_refresh_replaces_snapshot_in_foreground() {
    let store = FakeStore::new();
    let ctx = TestContext::new(store);
    ctx.load_cart().await;

    ctx.store.seed_cart(vec![line(&product("P1", 100), 1, None)]);
    ctx.storefront
        .queries()
        .refresh(&ResourceKey::Cart)
        .await
        .unwrap();

    let snapshot = ctx
        .storefront
        .cache()
        .get::<CartLine>(&ResourceKey::Cart)
        .unwrap();
    assert_eq!(snapshot.data.len(), 1);
    assert!(!snapshot.is_stale());
}
