//! Core types for the Al-Ghazaly storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod favorite;
pub mod id;
pub mod locale;
pub mod order;
pub mod price;
pub mod product;
pub mod status;

pub use cart::{CartLine, CartTotals, DiscountDetails, DiscountType, OrderSummary};
pub use favorite::FavoriteEntry;
pub use id::*;
pub use locale::{Locale, LocaleError};
pub use order::{Order, OrderItem};
pub use price::{CurrencyCode, Price, PriceError, apply_percentage_discount, round_money};
pub use product::ProductSummary;
pub use status::OrderStatus;
