//! Optimistic cart and favorites mutations.
//!
//! Every mutation follows the same protocol:
//!
//! 1. Guard check (adds only). A duplicate is reported once through the
//!    notifier and the mutation ends as [`MutationOutcome::Rejected`] without
//!    touching the cache or the network.
//! 2. Capture the current snapshot into a [`PendingMutation`].
//! 3. Write the expected result to the cache.
//! 4. Await the remote call. This is the only suspension point.
//! 5. On success, invalidate the key so the next read reconciles server-side
//!    effects such as repricing.
//! 6. On failure, restore the captured snapshot and return
//!    [`MutationError::Transport`].
//!
//! Steps 1 to 3 and the rollback run without an `.await`, so no other task
//! observes a half-applied mutation. Concurrent mutations of the same key are
//! not serialized: the last optimistic write wins, and a rollback restores the
//! snapshot its own mutation captured even if a later mutation wrote since.

mod cart;
mod favorites;
mod pending;

pub use pending::{MutationId, MutationState, PendingMutation};

use std::fmt;
use std::sync::Arc;

use alghazaly_core::{Locale, PriceError};
use thiserror::Error;

use crate::api::{ApiError, StoreApi};
use crate::cache::LocalCache;
use crate::guard::{DuplicateGuard, GuardRejection};

/// The named mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Add,
    AddBundle,
    UpdateQuantity,
    Remove,
    Clear,
    VoidBundle,
    ToggleFavorite,
}

impl MutationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::AddBundle => "add_bundle",
            Self::UpdateQuantity => "update_quantity",
            Self::Remove => "remove",
            Self::Clear => "clear",
            Self::VoidBundle => "void_bundle",
            Self::ToggleFavorite => "toggle_favorite",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by the mutation coordinator.
#[derive(Debug, Error)]
pub enum MutationError {
    /// The remote call failed. The cache has already been rolled back.
    #[error("{kind} failed: {source}")]
    Transport {
        kind: MutationKind,
        #[source]
        source: ApiError,
    },

    /// Bundle discount outside 0-100%. Nothing was written.
    #[error(transparent)]
    Price(#[from] PriceError),

    /// Requested quantity does not fit a cart line. Nothing was written.
    #[error("quantity {0} is out of range")]
    QuantityOutOfRange(i64),
}

impl MutationError {
    /// Whether the user can simply try again.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// The underlying API error, if any.
    #[must_use]
    pub const fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Transport { source, .. } => Some(source),
            Self::Price(_) | Self::QuantityOutOfRange(_) => None,
        }
    }

    fn transport(kind: MutationKind) -> impl FnOnce(ApiError) -> Self {
        move |source| Self::Transport { kind, source }
    }
}

/// Result of a guarded mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome<T = ()> {
    /// The backend accepted the mutation.
    Confirmed(T),
    /// The duplicate guard refused it; nothing was sent.
    Rejected(GuardRejection),
}

impl<T> MutationOutcome<T> {
    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }

    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// Applies mutations to the cache and the backend.
///
/// Cheap to clone; clones share the client, cache and notifier.
#[derive(Clone)]
pub struct MutationCoordinator {
    client: Arc<dyn StoreApi>,
    cache: LocalCache,
    guard: DuplicateGuard,
    locale: Locale,
}

impl MutationCoordinator {
    #[must_use]
    pub fn new(
        client: Arc<dyn StoreApi>,
        cache: LocalCache,
        guard: DuplicateGuard,
        locale: Locale,
    ) -> Self {
        Self {
            client,
            cache,
            guard,
            locale,
        }
    }

    /// Locale used for duplicate notices.
    #[must_use]
    pub const fn locale(&self) -> Locale {
        self.locale
    }
}

impl fmt::Debug for MutationCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationCoordinator")
            .field("locale", &self.locale)
            .finish_non_exhaustive()
    }
}
