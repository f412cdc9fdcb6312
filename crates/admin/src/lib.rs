//! Neemon Admin library.
//!
//! Seller-facing order and product management over the hosted store, kept
//! as a library so it can be tested and driven from the CLI.
//!
//! # Security
//!
//! This crate holds the Supabase service-role key, which bypasses row-level
//! security. Only deploy behind a private network.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;

pub use state::AppState;
