//! Bookkeeping for one in-flight mutation.

use std::fmt;

use tracing::{debug, error, warn};
use uuid::Uuid;

use super::MutationKind;
use crate::cache::{CacheSnapshot, Cacheable, LocalCache, ResourceKey};

/// Correlates the log lines of one mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MutationId(Uuid);

impl MutationId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MutationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle of a mutation.
///
/// ```text
/// Idle -> Guarding -> OptimisticallyApplied -> Confirmed
///             |                            \-> RolledBack
///             \-> Rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationState {
    Idle,
    Guarding,
    OptimisticallyApplied,
    Confirmed,
    RolledBack,
    Rejected,
}

impl MutationState {
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Guarding)
                | (Self::Guarding, Self::OptimisticallyApplied | Self::Rejected)
                | (Self::OptimisticallyApplied, Self::Confirmed | Self::RolledBack)
        )
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::RolledBack | Self::Rejected)
    }
}

/// A mutation between its guard check and its settlement.
///
/// Holds the snapshot captured before the optimistic write so a failure can
/// put it back. Settling (`confirm`, `roll_back`, `reject`) consumes the
/// value, so a settled mutation cannot be settled again.
#[derive(Debug)]
pub struct PendingMutation<T> {
    id: MutationId,
    kind: MutationKind,
    resource_key: ResourceKey,
    previous_snapshot: Option<CacheSnapshot<T>>,
    state: MutationState,
}

impl<T: Cacheable> PendingMutation<T> {
    /// Start a mutation of `resource_key`. The state is already `Guarding`.
    #[must_use]
    pub fn begin(kind: MutationKind, resource_key: ResourceKey) -> Self {
        let mut pending = Self {
            id: MutationId::new(),
            kind,
            resource_key,
            previous_snapshot: None,
            state: MutationState::Idle,
        };
        pending.advance(MutationState::Guarding);
        pending
    }

    #[must_use]
    pub const fn id(&self) -> MutationId {
        self.id
    }

    #[must_use]
    pub const fn state(&self) -> MutationState {
        self.state
    }

    #[must_use]
    pub const fn resource_key(&self) -> &ResourceKey {
        &self.resource_key
    }

    /// The snapshot captured before the optimistic write.
    #[must_use]
    pub const fn previous_snapshot(&self) -> Option<&CacheSnapshot<T>> {
        self.previous_snapshot.as_ref()
    }

    fn advance(&mut self, next: MutationState) {
        if self.state.can_transition_to(next) {
            self.state = next;
        } else {
            error!(
                mutation_id = %self.id,
                from = ?self.state,
                to = ?next,
                "Invalid mutation state transition"
            );
        }
    }

    /// Write `data` optimistically, remembering `previous` for rollback.
    ///
    /// `previous` must be the snapshot the new data was derived from, read
    /// without an intervening `.await`.
    pub fn apply(&mut self, cache: &LocalCache, previous: Option<CacheSnapshot<T>>, data: Vec<T>) {
        self.previous_snapshot = previous;
        cache.set(&self.resource_key, data);
        self.advance(MutationState::OptimisticallyApplied);
        debug!(
            mutation_id = %self.id,
            kind = %self.kind,
            resource_key = %self.resource_key,
            "Applied optimistic update"
        );
    }

    /// The remote call succeeded: mark the key stale so the next read
    /// picks up server-side effects.
    pub fn confirm(mut self, cache: &LocalCache) -> MutationState {
        cache.invalidate(&self.resource_key);
        self.advance(MutationState::Confirmed);
        debug!(
            mutation_id = %self.id,
            kind = %self.kind,
            resource_key = %self.resource_key,
            "Mutation confirmed"
        );
        self.state
    }

    /// The remote call failed: put the captured snapshot back.
    pub fn roll_back(mut self, cache: &LocalCache) -> MutationState {
        cache.restore(&self.resource_key, self.previous_snapshot.take());
        self.advance(MutationState::RolledBack);
        warn!(
            mutation_id = %self.id,
            kind = %self.kind,
            resource_key = %self.resource_key,
            "Mutation rolled back"
        );
        self.state
    }

    /// The guard refused the mutation before anything was written.
    pub fn reject(mut self) -> MutationState {
        self.advance(MutationState::Rejected);
        debug!(mutation_id = %self.id, kind = %self.kind, "Mutation rejected by guard");
        self.state
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use alghazaly_core::Order;

    use super::*;
    use crate::config::CacheConfig;

    #[test]
    fn test_transitions() {
        use MutationState::{Confirmed, Guarding, Idle, OptimisticallyApplied, Rejected, RolledBack};

        assert!(Idle.can_transition_to(Guarding));
        assert!(Guarding.can_transition_to(Rejected));
        assert!(OptimisticallyApplied.can_transition_to(RolledBack));
        assert!(!Idle.can_transition_to(OptimisticallyApplied));
        assert!(!Guarding.can_transition_to(Confirmed));

        for terminal in [Confirmed, RolledBack, Rejected] {
            assert!(terminal.is_terminal());
            for next in [Idle, Guarding, OptimisticallyApplied, Confirmed, RolledBack, Rejected] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_apply_then_roll_back_restores() {
        let cache = LocalCache::new(&CacheConfig::default());
        cache.set::<Order>(&ResourceKey::Orders, Vec::new());
        let before = cache.get::<Order>(&ResourceKey::Orders);

        let mut pending = PendingMutation::<Order>::begin(MutationKind::Clear, ResourceKey::Orders);
        assert_eq!(pending.state(), MutationState::Guarding);
        pending.apply(&cache, before.clone(), Vec::new());
        assert_eq!(pending.state(), MutationState::OptimisticallyApplied);
        assert_eq!(pending.previous_snapshot(), before.as_ref());

        assert_eq!(pending.roll_back(&cache), MutationState::RolledBack);
        assert_eq!(cache.get::<Order>(&ResourceKey::Orders), before);
    }

    #[test]
    fn test_confirm_invalidates() {
        let cache = LocalCache::new(&CacheConfig::default());
        let mut pending = PendingMutation::<Order>::begin(MutationKind::Clear, ResourceKey::Orders);
        pending.apply(&cache, None, Vec::new());

        assert_eq!(pending.confirm(&cache), MutationState::Confirmed);
        assert!(cache.get::<Order>(&ResourceKey::Orders).unwrap().invalidated);
    }

    #[test]
    fn test_reject_from_guarding() {
        let pending = PendingMutation::<Order>::begin(MutationKind::Add, ResourceKey::Cart);
        assert_eq!(pending.reject(), MutationState::Rejected);
    }
}
