//! Storefront handle shared across the app.

use std::sync::Arc;

use crate::api::{ApiError, RestClient, StoreApi};
use crate::cache::LocalCache;
use crate::config::StorefrontConfig;
use crate::guard::{DuplicateGuard, DuplicateNotifier};
use crate::mutation::MutationCoordinator;
use crate::queries::Queries;

/// One client, one cache and one notifier, wired together.
///
/// This struct is cheaply cloneable via `Arc`. Every clone shares the same
/// cache, so a mutation made through one clone is visible to reads made
/// through any other.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: StorefrontConfig,
    cache: LocalCache,
    mutations: MutationCoordinator,
    queries: Queries,
}

impl Storefront {
    /// Create a storefront talking to the configured backend over HTTP.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        config: StorefrontConfig,
        notifier: Arc<dyn DuplicateNotifier>,
    ) -> Result<Self, ApiError> {
        let client = RestClient::new(&config.api)?;
        Ok(Self::with_client(config, Arc::new(client), notifier))
    }

    /// Create a storefront on top of any [`StoreApi`] implementation.
    #[must_use]
    pub fn with_client(
        config: StorefrontConfig,
        client: Arc<dyn StoreApi>,
        notifier: Arc<dyn DuplicateNotifier>,
    ) -> Self {
        let cache = LocalCache::new(&config.cache);
        let mutations = MutationCoordinator::new(
            Arc::clone(&client),
            cache.clone(),
            DuplicateGuard::new(notifier),
            config.locale,
        );
        let queries = Queries::new(client, cache.clone(), config.shipping_cost);

        Self {
            inner: Arc::new(StorefrontInner {
                config,
                cache,
                mutations,
                queries,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the shared cache.
    #[must_use]
    pub fn cache(&self) -> &LocalCache {
        &self.inner.cache
    }

    /// Get a reference to the mutation coordinator.
    #[must_use]
    pub fn mutations(&self) -> &MutationCoordinator {
        &self.inner.mutations
    }

    /// Get a reference to the read path.
    #[must_use]
    pub fn queries(&self) -> &Queries {
        &self.inner.queries
    }
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
