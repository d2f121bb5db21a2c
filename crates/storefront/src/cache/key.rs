//! Logical resource keys.

use std::fmt;

use alghazaly_core::CustomerId;

/// The kind of collection a key holds. Decides the freshness window.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum ResourceKind {
    Cart,
    Favorites,
    Orders,
}

impl ResourceKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::Favorites => "favorites",
            Self::Orders => "orders",
        }
    }
}

/// Cache key for one logical resource.
///
/// The signed-in customer's own resources use the bare variants; staff views
/// of another customer are scoped by [`CustomerId`] so they never collide.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum ResourceKey {
    Cart,
    Favorites,
    Orders,
    Customer {
        customer_id: CustomerId,
        kind: ResourceKind,
    },
}

impl ResourceKey {
    /// Key for a staff view of a customer's resource.
    #[must_use]
    pub const fn customer(customer_id: CustomerId, kind: ResourceKind) -> Self {
        Self::Customer { customer_id, kind }
    }

    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        match self {
            Self::Cart => ResourceKind::Cart,
            Self::Favorites => ResourceKind::Favorites,
            Self::Orders => ResourceKind::Orders,
            Self::Customer { kind, .. } => *kind,
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Customer { customer_id, kind } => {
                write!(f, "customer:{customer_id}:{}", kind.as_str())
            }
            other => f.write_str(other.kind().as_str()),
        }
    }
}
