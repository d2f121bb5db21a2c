//! Al-Ghazaly Core - Shared domain types.
//!
//! This crate provides the types shared by every Al-Ghazaly client component:
//! - `storefront` - Cart/favorites cache synchronization and the REST client
//! - `cli` - Developer tooling for inspecting a live cart
//!
//! # Architecture
//!
//! The core crate contains only types and pure computations - no I/O, no HTTP
//! clients, no caches. This keeps it lightweight and usable anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, money arithmetic, cart lines, favorites, orders

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
