//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `cart` - Cart lines, quantity normalization, persistence
//! - `wishlist` - Saved items and the cart/wishlist moves
//! - `auth` - Identity facade over the local and remote backings
//! - `addresses` - Saved delivery addresses
//! - `reviews` - Product reviews
//! - `preferences` - Delivery location, theme, launch-notify list
//! - `catalog` - Cached reads of the remote products table
//! - `checkout` - Order placement

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod preferences;
pub mod reviews;
pub mod wishlist;
