//! Neemon Storefront library.
//!
//! The client-side state engine of the storefront (cart, wishlist, identity,
//! saved addresses, reviews, preferences, order placement and cross-tab
//! sync) plus the JSON surface that exposes it. Kept as a library so the CLI
//! and integration tests drive the same code as the server.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod bus;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

pub use state::{IdentityBacking, Storefront, StorefrontOptions};
