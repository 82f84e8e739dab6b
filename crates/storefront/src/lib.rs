//! Bazaar Storefront library.
//!
//! This crate provides the shop backend as a library, allowing it to be
//! tested and reused. The binary in `main.rs` only wires configuration,
//! logging and the datastore to [`routes::app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
