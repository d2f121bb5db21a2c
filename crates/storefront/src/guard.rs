//! Duplicate-line prevention for add-to-cart.
//!
//! A product may appear in the cart at most once, whether as a standalone
//! line or as part of a bundle. The check is a pure function of the cart
//! snapshot; telling the user about a rejected add goes through a
//! [`DuplicateNotifier`] so the UI layer decides how to present it.

use std::collections::HashSet;
use std::sync::Arc;

use alghazaly_core::{CartLine, Locale, ProductId};
use tracing::warn;

use crate::cache::CacheSnapshot;

/// Whether `product_id` already has a line in the cart.
///
/// Bundle membership is ignored: a bundled line blocks a standalone add and
/// vice versa. An absent snapshot has no duplicates.
#[must_use]
pub fn is_duplicate(snapshot: Option<&CacheSnapshot<CartLine>>, product_id: &ProductId) -> bool {
    snapshot.is_some_and(|s| s.items().iter().any(|line| &line.product_id == product_id))
}

/// The first of `product_ids` that is already in the cart or repeats an
/// earlier id in the same request.
#[must_use]
pub fn first_duplicate<'a>(
    snapshot: Option<&CacheSnapshot<CartLine>>,
    product_ids: impl IntoIterator<Item = &'a ProductId>,
) -> Option<&'a ProductId> {
    let mut seen = HashSet::new();
    product_ids
        .into_iter()
        .find(|id| !seen.insert(*id) || is_duplicate(snapshot, id))
}

/// User-facing warning for a rejected add.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateNotice {
    pub locale: Locale,
    pub title: &'static str,
    pub message: &'static str,
    /// Whether a warning haptic should accompany the message.
    pub haptic: bool,
}

impl DuplicateNotice {
    #[must_use]
    pub const fn new(locale: Locale) -> Self {
        let (title, message) = match locale {
            Locale::En => (
                "Already in cart",
                "This product is already in your cart. Change its quantity from the cart instead.",
            ),
            Locale::Ar => (
                "موجود بالفعل في السلة",
                "هذا المنتج موجود بالفعل في سلتك. يمكنك تعديل الكمية من السلة.",
            ),
        };
        Self {
            locale,
            title,
            message,
            haptic: true,
        }
    }
}

/// Presents [`DuplicateNotice`]s to the user.
pub trait DuplicateNotifier: Send + Sync {
    fn notify(&self, notice: &DuplicateNotice);
}

/// Notifier that only logs. Used when no UI is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl DuplicateNotifier for LogNotifier {
    fn notify(&self, notice: &DuplicateNotice) {
        warn!(locale = notice.locale.tag(), title = notice.title, "{}", notice.message);
    }
}

/// Why an add was refused before reaching the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardRejection {
    /// The product that already has a cart line.
    pub product_id: ProductId,
}

/// The predicate plus the notifier it reports through.
#[derive(Clone)]
pub struct DuplicateGuard {
    notifier: Arc<dyn DuplicateNotifier>,
}

impl DuplicateGuard {
    #[must_use]
    pub fn new(notifier: Arc<dyn DuplicateNotifier>) -> Self {
        Self { notifier }
    }

    /// Check a single-product add.
    ///
    /// # Errors
    ///
    /// Returns the rejection if the product is already in the cart. The
    /// caller is expected to [`notify_duplicate`](Self::notify_duplicate).
    pub fn check(
        &self,
        snapshot: Option<&CacheSnapshot<CartLine>>,
        product_id: &ProductId,
    ) -> Result<(), GuardRejection> {
        self.check_all(snapshot, std::iter::once(product_id))
    }

    /// Check a bundle add. Rejects on the first product already in the cart
    /// or listed twice.
    ///
    /// # Errors
    ///
    /// Returns the rejection for the first duplicate found.
    pub fn check_all<'a>(
        &self,
        snapshot: Option<&CacheSnapshot<CartLine>>,
        product_ids: impl IntoIterator<Item = &'a ProductId>,
    ) -> Result<(), GuardRejection> {
        first_duplicate(snapshot, product_ids).map_or(Ok(()), |id| {
            Err(GuardRejection {
                product_id: id.clone(),
            })
        })
    }

    /// Tell the user their add was rejected. Call once per rejected attempt.
    pub fn notify_duplicate(&self, locale: Locale) {
        self.notifier.notify(&DuplicateNotice::new(locale));
    }
}

impl std::fmt::Debug for DuplicateGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplicateGuard").finish_non_exhaustive()
    }
}
