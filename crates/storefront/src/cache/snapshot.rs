//! Cached values and the snapshots handed out to callers.

use alghazaly_core::{CartLine, FavoriteEntry, Order};
use chrono::{DateTime, TimeDelta, Utc};

use super::key::{ResourceKey, ResourceKind};

/// Cached value types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheValue {
    Cart(Vec<CartLine>),
    Favorites(Vec<FavoriteEntry>),
    Orders(Vec<Order>),
}

/// An item type that can be stored in the [`LocalCache`](super::LocalCache).
pub trait Cacheable: Clone + Send + Sync + 'static {
    /// The resource kind this item type belongs to.
    const KIND: ResourceKind;

    fn into_value(items: Vec<Self>) -> CacheValue;

    /// Borrow the items if `value` holds this type.
    fn from_value(value: &CacheValue) -> Option<&[Self]>;
}

impl Cacheable for CartLine {
    const KIND: ResourceKind = ResourceKind::Cart;

    fn into_value(items: Vec<Self>) -> CacheValue {
        CacheValue::Cart(items)
    }

    fn from_value(value: &CacheValue) -> Option<&[Self]> {
        match value {
            CacheValue::Cart(lines) => Some(lines),
            _ => None,
        }
    }
}

impl Cacheable for FavoriteEntry {
    const KIND: ResourceKind = ResourceKind::Favorites;

    fn into_value(items: Vec<Self>) -> CacheValue {
        CacheValue::Favorites(items)
    }

    fn from_value(value: &CacheValue) -> Option<&[Self]> {
        match value {
            CacheValue::Favorites(entries) => Some(entries),
            _ => None,
        }
    }
}

impl Cacheable for Order {
    const KIND: ResourceKind = ResourceKind::Orders;

    fn into_value(items: Vec<Self>) -> CacheValue {
        CacheValue::Orders(items)
    }

    fn from_value(value: &CacheValue) -> Option<&[Self]> {
        match value {
            CacheValue::Orders(orders) => Some(orders),
            _ => None,
        }
    }
}

/// A point-in-time copy of one cached resource.
///
/// An absent resource is `None` at the call site (`Option<CacheSnapshot<T>>`),
/// so `data` is always the last-known-good collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSnapshot<T> {
    pub key: ResourceKey,
    pub data: Vec<T>,
    pub fetched_at: DateTime<Utc>,
    pub stale_after: TimeDelta,
    /// Set by [`LocalCache::invalidate`](super::LocalCache::invalidate).
    pub invalidated: bool,
}

impl<T> CacheSnapshot<T> {
    /// Whether the next read should trigger a refetch.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.is_stale_at(Utc::now())
    }

    #[must_use]
    pub fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        self.invalidated || now - self.fetched_at > self.stale_after
    }

    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(invalidated: bool) -> CacheSnapshot<Order> {
        CacheSnapshot {
            key: ResourceKey::Orders,
            data: Vec::new(),
            fetched_at: Utc::now(),
            stale_after: TimeDelta::seconds(30),
            invalidated,
        }
    }

    #[test]
    fn test_fresh_until_window_elapses() {
        let snap = snapshot(false);
        assert!(!snap.is_stale_at(snap.fetched_at + TimeDelta::seconds(30)));
        assert!(snap.is_stale_at(snap.fetched_at + TimeDelta::seconds(31)));
    }

    #[test]
    fn test_invalidated_is_stale_immediately() {
        let snap = snapshot(true);
        assert!(snap.is_stale_at(snap.fetched_at));
    }

    #[test]
    fn test_value_kind_mismatch() {
        let value = CartLine::into_value(Vec::new());
        assert!(CartLine::from_value(&value).is_some());
        assert!(Order::from_value(&value).is_none());
    }
}
