//! Neemon Core - Shared types library.
//!
//! This crate provides common types used across all Neemon components:
//! - `storefront` - Client state engine and public storefront surface
//! - `admin` - Seller-facing order and product management
//! - `cli` - Command-line driver for the storefront and admin
//!
//! # Architecture
//!
//! The core crate contains types and traits. The only I/O it can perform is
//! the PostgREST client behind the `remote` feature, so the types stay usable
//! anywhere (tests, CLI, servers) without pulling in an HTTP stack.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, email, price, statuses, cart lines, orders, products
//! - [`remote`] - Query model and the [`remote::RemoteStore`] trait for the
//!   hosted products/orders tables

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod remote;
pub mod types;

pub use types::*;

#[doc(hidden)]
pub use uuid;
