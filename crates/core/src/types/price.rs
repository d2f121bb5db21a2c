//! Type-safe money arithmetic using decimal amounts.
//!
//! The backend stores prices as floating point numbers and rounds every
//! derived amount to two decimal places. These helpers reproduce that
//! arithmetic on [`Decimal`] so client-side estimates (optimistic cart lines,
//! order summaries) agree with what the server will later confirm.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of decimal places kept for every monetary amount.
pub const MONEY_SCALE: u32 = 2;

/// Errors produced by price computations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    /// A discount percentage outside `0..=100`.
    #[error("discount percentage must be between 0 and 100 (got {0})")]
    InvalidPercentage(Decimal),
}

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (pounds, not piastres).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in the store's default currency.
    #[must_use]
    pub fn egp(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::EGP)
    }

    /// Format for display (e.g., "EGP 150.00").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{} {:.2}", self.currency_code.code(), round_money(self.amount))
    }
}

/// ISO 4217 currency codes the store trades in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    EGP,
}

impl CurrencyCode {
    /// The three-letter code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::EGP => "EGP",
        }
    }
}

/// Round a monetary amount to two decimal places.
///
/// Ties round to even, matching the backend's `round(x, 2)`.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Apply a percentage discount to a unit price.
///
/// Computes `price * (1 - percentage / 100)` rounded to two decimal places.
///
/// # Errors
///
/// Returns [`PriceError::InvalidPercentage`] if `percentage` is negative or
/// greater than 100.
pub fn apply_percentage_discount(
    price: Decimal,
    percentage: Decimal,
) -> Result<Decimal, PriceError> {
    if percentage.is_sign_negative() || percentage > Decimal::ONE_HUNDRED {
        return Err(PriceError::InvalidPercentage(percentage));
    }

    let factor = Decimal::ONE - percentage / Decimal::ONE_HUNDRED;
    Ok(round_money(price * factor))
}
