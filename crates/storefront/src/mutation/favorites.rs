//! Favorites mutations.

use alghazaly_core::{FavoriteEntry, ProductId, ProductSummary};
use tracing::{debug, instrument};

use super::{MutationCoordinator, MutationError, MutationKind, PendingMutation};
use crate::cache::ResourceKey;

/// Make `product`'s membership in `entries` match `favorite`.
fn set_membership(entries: &mut Vec<FavoriteEntry>, product: &ProductSummary, favorite: bool) {
    let present = contains(entries, &product.id);
    if favorite && !present {
        entries.push(FavoriteEntry::for_product(product.clone()));
    } else if !favorite && present {
        entries.retain(|entry| entry.product_id != product.id);
    }
}

fn contains(entries: &[FavoriteEntry], product_id: &ProductId) -> bool {
    entries.iter().any(|entry| &entry.product_id == product_id)
}

impl MutationCoordinator {
    /// Flip whether `product` is a favorite. Returns the new state as
    /// reported by the backend.
    ///
    /// The favorites list is flipped optimistically. On success it is
    /// reconciled with the backend's answer before being marked stale, so a
    /// list that was never loaded still ends up correct.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError::Transport`] if the backend call fails; the
    /// favorites list is rolled back first.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn toggle_favorite(&self, product: &ProductSummary) -> Result<bool, MutationError> {
        let mut pending =
            PendingMutation::begin(MutationKind::ToggleFavorite, ResourceKey::Favorites);
        let previous = self.cache.get::<FavoriteEntry>(&ResourceKey::Favorites);

        let mut entries = previous.as_ref().map(|s| s.data.clone()).unwrap_or_default();
        let favorite = !contains(&entries, &product.id);
        set_membership(&mut entries, product, favorite);
        pending.apply(&self.cache, previous, entries);

        match self.client.favorites_toggle(&product.id).await {
            Ok(is_favorite) => {
                if is_favorite != favorite {
                    debug!(is_favorite, "Backend disagreed with optimistic toggle");
                }
                if let Some(current) = self.cache.get::<FavoriteEntry>(&ResourceKey::Favorites) {
                    let mut entries = current.data;
                    set_membership(&mut entries, product, is_favorite);
                    self.cache.set(&ResourceKey::Favorites, entries);
                }
                pending.confirm(&self.cache);
                Ok(is_favorite)
            }
            Err(e) => {
                pending.roll_back(&self.cache);
                Err(MutationError::transport(MutationKind::ToggleFavorite)(e))
            }
        }
    }
}
