//! Status enums for backend entities.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// Maps to the backend's order status strings. There is deliberately no
/// catch-all variant: an unrecognized status fails deserialization so a
/// backend contract change surfaces as an error instead of a silent default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Preparing,
    Shipped,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Whether the order is still moving through fulfillment.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(
            self,
            Self::Pending | Self::Preparing | Self::Shipped | Self::OutForDelivery
        )
    }

    /// Whether the order has left the warehouse but not yet been delivered.
    #[must_use]
    pub const fn is_in_transit(self) -> bool {
        matches!(self, Self::Shipped | Self::OutForDelivery)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_wire_names() {
        let status: OrderStatus = serde_json::from_str("\"out_for_delivery\"").unwrap();
        assert_eq!(status, OrderStatus::OutForDelivery);
        assert_eq!(
            serde_json::to_string(&OrderStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
    }

    #[test]
    fn test_unknown_order_status_is_rejected() {
        assert!(serde_json::from_str::<OrderStatus>("\"lost_in_space\"").is_err());
    }

    #[test]
    fn test_open_statuses() {
        assert!(OrderStatus::Pending.is_open());
        assert!(OrderStatus::Shipped.is_in_transit());
        assert!(!OrderStatus::Delivered.is_open());
        assert!(!OrderStatus::Cancelled.is_open());
    }
}
