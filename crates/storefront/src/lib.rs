//! Al-Ghazaly storefront client library.
//!
//! Keeps a local, optimistically updated copy of the customer's cart,
//! favorites and orders in sync with the backend:
//!
//! - [`api`]: the backend contract ([`api::StoreApi`]) and its HTTP client
//! - [`cache`]: versioned, stale-while-revalidate snapshot store
//! - [`guard`]: one-line-per-product rule for add-to-cart
//! - [`mutation`]: optimistic mutations with rollback
//! - [`queries`]: the read path
//! - [`state`]: the [`Storefront`] handle wiring it all together

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod guard;
pub mod mutation;
pub mod queries;
pub mod state;

#[cfg(test)]
mod testing;

pub use error::StorefrontError;
pub use state::Storefront;
