//! Core types for Neemon.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod email;
pub mod id;
pub mod location;
pub mod order;
pub mod price;
pub mod product;
pub mod status;
pub mod user;

pub use cart::{CartLine, total_units};
pub use email::{Email, EmailError};
pub use id::*;
pub use location::DeliveryLocation;
pub use order::Order;
pub use price::{CurrencyCode, Price};
pub use product::{Category, Product, ProductDraft};
pub use status::*;
pub use user::PublicUser;
