//! Cart lines and cart totals.
//!
//! A cart is a plain sequence of [`CartLine`]s. The backend is the source of
//! truth for pricing; the arithmetic here mirrors the server's so that an
//! optimistic cart renders the same totals the server will confirm.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::id::{BundleGroupId, ProductId};
use crate::types::price::round_money;
use crate::types::product::ProductSummary;

/// Where a line's discount came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    #[default]
    None,
    Bundle,
    Promotion,
    AdminDiscount,
}

/// Discount applied to a cart line.
///
/// The backend sends `{}` for lines that never had a discount, so every
/// field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DiscountDetails {
    /// Discount category.
    #[serde(default)]
    pub discount_type: DiscountType,
    /// Percentage or fixed amount, depending on the source.
    #[serde(default, with = "rust_decimal::serde::float")]
    pub discount_value: Decimal,
    /// ID of the bundle offer or promotion that granted the discount.
    #[serde(default)]
    pub discount_source_id: Option<String>,
}

impl DiscountDetails {
    /// A bundle discount of `percentage` granted by `offer_id`.
    #[must_use]
    pub const fn bundle(percentage: Decimal, offer_id: Option<String>) -> Self {
        Self {
            discount_type: DiscountType::Bundle,
            discount_value: percentage,
            discount_source_id: offer_id,
        }
    }
}

/// One product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product in this line. At most one line per product per cart.
    pub product_id: ProductId,
    /// Quantity, always at least 1.
    pub quantity: u32,
    /// Bundle this line belongs to, if it was added as part of a bundle.
    #[serde(default)]
    pub bundle_group_id: Option<BundleGroupId>,
    /// Unit price before discounts.
    #[serde(with = "rust_decimal::serde::float")]
    pub original_unit_price: Decimal,
    /// Unit price after discounts.
    #[serde(with = "rust_decimal::serde::float")]
    pub final_unit_price: Decimal,
    /// Discount applied to this line.
    #[serde(default)]
    pub discount_details: DiscountDetails,
    /// Product details for rendering.
    pub product: ProductSummary,
}

impl CartLine {
    /// Whether this line was added as part of a bundle.
    #[must_use]
    pub const fn is_bundled(&self) -> bool {
        self.bundle_group_id.is_some()
    }

    /// `final_unit_price * quantity`.
    #[must_use]
    pub fn line_subtotal(&self) -> Decimal {
        self.final_unit_price * Decimal::from(self.quantity)
    }

    /// `(original_unit_price - final_unit_price) * quantity`.
    #[must_use]
    pub fn line_discount(&self) -> Decimal {
        (self.original_unit_price - self.final_unit_price) * Decimal::from(self.quantity)
    }

    /// Drop bundle membership and restore the undiscounted price.
    pub fn void_bundle(&mut self) {
        self.bundle_group_id = None;
        self.final_unit_price = self.original_unit_price;
        self.discount_details = DiscountDetails::default();
    }
}

/// Totals over a set of cart lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CartTotals {
    /// Sum of undiscounted line amounts.
    pub subtotal: Decimal,
    /// Sum of per-line discounts.
    pub total_discount: Decimal,
    /// `subtotal - total_discount`.
    pub total: Decimal,
    /// Sum of quantities, saturating at `u32::MAX`.
    pub item_count: u32,
}

impl CartTotals {
    /// Compute totals the way the backend does: sum, then round each figure.
    #[must_use]
    pub fn from_lines(lines: &[CartLine]) -> Self {
        let (subtotal, total_discount) =
            lines
                .iter()
                .fold((Decimal::ZERO, Decimal::ZERO), |(sub, disc), line| {
                    let quantity = Decimal::from(line.quantity);
                    (
                        sub + line.original_unit_price * quantity,
                        disc + line.line_discount(),
                    )
                });

        Self {
            subtotal: round_money(subtotal),
            total_discount: round_money(total_discount),
            total: round_money(subtotal - total_discount),
            item_count: lines
                .iter()
                .fold(0, |count: u32, l| count.saturating_add(l.quantity)),
        }
    }
}

/// Checkout summary: cart totals plus flat-rate shipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    /// Cart totals.
    pub totals: CartTotals,
    /// Flat shipping cost.
    pub shipping_cost: Decimal,
    /// `totals.total + shipping_cost`.
    pub grand_total: Decimal,
}

impl OrderSummary {
    /// Summarize a cart for checkout.
    #[must_use]
    pub fn new(lines: &[CartLine], shipping_cost: Decimal) -> Self {
        let totals = CartTotals::from_lines(lines);
        Self {
            totals,
            shipping_cost,
            grand_total: round_money(totals.total + shipping_cost),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: &str, price: Decimal) -> ProductSummary {
        ProductSummary {
            id: ProductId::new(id),
            name: format!("Part {id}"),
            name_ar: None,
            price,
            sku: None,
            image_url: None,
            stock_quantity: None,
        }
    }

    fn line(id: &str, quantity: u32, original: Decimal, final_price: Decimal) -> CartLine {
        CartLine {
            product_id: ProductId::new(id),
            quantity,
            bundle_group_id: None,
            original_unit_price: original,
            final_unit_price: final_price,
            discount_details: DiscountDetails::default(),
            product: product(id, original),
        }
    }

    #[test]
    fn test_totals_match_backend_arithmetic() {
        let lines = vec![
            line("p1", 2, Decimal::new(100, 0), Decimal::new(100, 0)),
            // Bundled at 10% off
            line("p2", 1, Decimal::new(250, 0), Decimal::new(225, 0)),
        ];

        let totals = CartTotals::from_lines(&lines);
        assert_eq!(totals.subtotal, Decimal::new(450, 0));
        assert_eq!(totals.total_discount, Decimal::new(25, 0));
        assert_eq!(totals.total, Decimal::new(425, 0));
        assert_eq!(totals.item_count, 3);
    }

    #[test]
    fn test_item_count_saturates() {
        let lines = vec![
            line("p1", u32::MAX, Decimal::ONE, Decimal::ONE),
            line("p2", u32::MAX, Decimal::ONE, Decimal::ONE),
        ];
        assert_eq!(CartTotals::from_lines(&lines).item_count, u32::MAX);
    }

    #[test]
    fn test_empty_cart_totals_are_zero() {
        assert_eq!(CartTotals::from_lines(&[]), CartTotals::default());
    }

    #[test]
    fn test_order_summary_adds_shipping() {
        let lines = vec![line("p1", 1, Decimal::new(9999, 2), Decimal::new(9999, 2))];
        let summary = OrderSummary::new(&lines, Decimal::new(150, 0));
        assert_eq!(summary.grand_total, Decimal::new(24999, 2));
    }

    #[test]
    fn test_void_bundle_restores_original_price() {
        let mut bundled = line("p1", 1, Decimal::new(200, 0), Decimal::new(170, 0));
        bundled.bundle_group_id = Some(BundleGroupId::new("b1"));
        bundled.discount_details = DiscountDetails::bundle(Decimal::new(15, 0), None);

        bundled.void_bundle();

        assert!(!bundled.is_bundled());
        assert_eq!(bundled.final_unit_price, Decimal::new(200, 0));
        assert_eq!(bundled.discount_details.discount_type, DiscountType::None);
    }

    #[test]
    fn test_cart_line_parses_empty_discount_details() {
        let json = r#"{
            "product_id": "p1",
            "quantity": 2,
            "original_unit_price": 120.0,
            "final_unit_price": 120.0,
            "discount_details": {},
            "bundle_group_id": null,
            "item_subtotal": 240.0,
            "product": {"id": "p1", "name": "Spark Plug", "price": 120.0}
        }"#;

        let parsed: CartLine = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.quantity, 2);
        assert_eq!(parsed.discount_details, DiscountDetails::default());
        assert!(!parsed.is_bundled());
    }
}
