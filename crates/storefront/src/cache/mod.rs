//! In-memory cache of cart, favorites and orders.
//!
//! Holds the last-known-good snapshot per [`ResourceKey`] together with the
//! time it was fetched. Staleness is tracked here rather than by `moka`'s TTL:
//! a stale snapshot is still served (stale-while-revalidate) while the query
//! layer refetches in the background, so entries are only ever evicted for
//! capacity.
//!
//! Every write stamps the entry with a fresh version number. Background
//! refetches use [`LocalCache::set_if_version`] so a slow response can never
//! overwrite an optimistic write that landed while it was in flight.

mod key;
mod snapshot;

pub use key::{ResourceKey, ResourceKind};
pub use snapshot::{CacheSnapshot, CacheValue, Cacheable};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use moka::ops::compute::{CompResult, Op};
use moka::sync::Cache;
use tracing::{debug, trace};

use crate::config::CacheConfig;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: CacheValue,
    fetched_at: DateTime<Utc>,
    stale_after: TimeDelta,
    invalidated: bool,
    version: u64,
}

/// Freshness window per resource kind.
#[derive(Debug, Clone, Copy)]
struct Freshness {
    cart: TimeDelta,
    favorites: TimeDelta,
    orders: TimeDelta,
}

impl Freshness {
    fn from_config(config: &CacheConfig) -> Self {
        Self {
            cart: to_delta(config.cart_stale_after),
            favorites: to_delta(config.favorites_stale_after),
            orders: to_delta(config.orders_stale_after),
        }
    }

    const fn for_kind(self, kind: ResourceKind) -> TimeDelta {
        match kind {
            ResourceKind::Cart => self.cart,
            ResourceKind::Favorites => self.favorites,
            ResourceKind::Orders => self.orders,
        }
    }
}

fn to_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}

/// Shared snapshot store. Cheap to clone; clones see the same entries.
#[derive(Clone)]
pub struct LocalCache {
    inner: Arc<LocalCacheInner>,
}

struct LocalCacheInner {
    entries: Cache<ResourceKey, CacheEntry>,
    freshness: Freshness,
    next_version: AtomicU64,
}

impl LocalCache {
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        let entries = Cache::builder().max_capacity(config.capacity).build();

        Self {
            inner: Arc::new(LocalCacheInner {
                entries,
                freshness: Freshness::from_config(config),
                next_version: AtomicU64::new(1),
            }),
        }
    }

    fn next_version(&self) -> u64 {
        self.inner.next_version.fetch_add(1, Ordering::Relaxed)
    }

    /// Freshness window applied to new entries for `key`.
    #[must_use]
    pub fn stale_after(&self, key: &ResourceKey) -> TimeDelta {
        self.inner.freshness.for_kind(key.kind())
    }

    /// Current snapshot for `key`, if one is cached.
    #[must_use]
    pub fn get<T: Cacheable>(&self, key: &ResourceKey) -> Option<CacheSnapshot<T>> {
        let entry = self.inner.entries.get(key)?;
        let data = T::from_value(&entry.value)?.to_vec();
        Some(CacheSnapshot {
            key: key.clone(),
            data,
            fetched_at: entry.fetched_at,
            stale_after: entry.stale_after,
            invalidated: entry.invalidated,
        })
    }

    /// Replace the snapshot for `key`, stamping it fresh.
    pub fn set<T: Cacheable>(&self, key: &ResourceKey, data: Vec<T>) {
        let entry = self.fresh_entry(key, T::into_value(data));
        trace!(resource_key = %key, version = entry.version, "Cache set");
        self.inner.entries.insert(key.clone(), entry);
    }

    /// Replace the snapshot only if nothing was written since `expected` was
    /// read from [`version`](Self::version). `None` means the key was absent.
    ///
    /// Returns whether the write happened.
    pub fn set_if_version<T: Cacheable>(
        &self,
        key: &ResourceKey,
        expected: Option<u64>,
        data: Vec<T>,
    ) -> bool {
        self.set_value_if_version(key, expected, T::into_value(data))
    }

    /// Untyped form of [`set_if_version`](Self::set_if_version), for
    /// fetches that produce a [`CacheValue`] directly.
    pub fn set_value_if_version(
        &self,
        key: &ResourceKey,
        expected: Option<u64>,
        value: CacheValue,
    ) -> bool {
        let fresh = self.fresh_entry(key, value);
        let result = self
            .inner
            .entries
            .entry_by_ref(key)
            .and_compute_with(|current| {
                if current.map(|e| e.value().version) == expected {
                    Op::Put(fresh)
                } else {
                    Op::Nop
                }
            });

        let written = matches!(result, CompResult::Inserted(_) | CompResult::ReplacedWith(_));
        if !written {
            debug!(resource_key = %key, "Discarding refetch superseded by a newer write");
        }
        written
    }

    /// Put back a snapshot captured earlier, exactly as it was.
    ///
    /// `None` means the resource was not cached when the snapshot was taken,
    /// so the key is removed.
    pub fn restore<T: Cacheable>(&self, key: &ResourceKey, previous: Option<CacheSnapshot<T>>) {
        match previous {
            Some(snapshot) => {
                let entry = CacheEntry {
                    value: T::into_value(snapshot.data),
                    fetched_at: snapshot.fetched_at,
                    stale_after: snapshot.stale_after,
                    invalidated: snapshot.invalidated,
                    version: self.next_version(),
                };
                self.inner.entries.insert(key.clone(), entry);
            }
            None => self.inner.entries.invalidate(key),
        }
    }

    /// Mark `key` stale without dropping its data. No-op if absent.
    pub fn invalidate(&self, key: &ResourceKey) {
        let version = self.next_version();
        self.inner
            .entries
            .entry_by_ref(key)
            .and_compute_with(|current| match current {
                Some(entry) => {
                    let mut entry = entry.into_value();
                    entry.invalidated = true;
                    entry.version = version;
                    Op::Put(entry)
                }
                None => Op::Nop,
            });
        trace!(resource_key = %key, "Cache invalidated");
    }

    /// Write version of `key`, if cached.
    #[must_use]
    pub fn version(&self, key: &ResourceKey) -> Option<u64> {
        self.inner.entries.get(key).map(|e| e.version)
    }

    /// Drop every cached resource.
    pub fn clear(&self) {
        self.inner.entries.invalidate_all();
    }

    fn fresh_entry(&self, key: &ResourceKey, value: CacheValue) -> CacheEntry {
        CacheEntry {
            value,
            fetched_at: Utc::now(),
            stale_after: self.stale_after(key),
            invalidated: false,
            version: self.next_version(),
        }
    }
}
