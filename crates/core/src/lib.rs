//! Bazaar Core - Shared domain types.
//!
//! This crate provides the types used across all Bazaar components:
//! - `storefront` - The HTTP shop backend (catalog, cart, checkout)
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP. Database encoding is available behind the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, validated contact fields, and order/payment tags

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
