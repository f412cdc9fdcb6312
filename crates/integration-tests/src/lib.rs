//! Shared fixtures for the cross-crate scenarios in `tests/`.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p neemon-integration-tests
//! ```
//!
//! Everything runs in process: the storefront and admin routers are driven
//! with `tower::ServiceExt::oneshot` over one shared [`MemoryRemote`], so
//! an order placed by a shopper is the same row the seller sees.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use neemon_core::remote::{MemoryRemote, tables};
use neemon_storefront::store::{LocalStore, MemoryStore};
use neemon_storefront::{IdentityBacking, Storefront, StorefrontOptions};
use serde_json::{Value, json};
use tower::ServiceExt;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A remote store holding three products: two listed, one hidden.
#[must_use]
pub fn seeded_remote() -> Arc<MemoryRemote> {
    Arc::new(MemoryRemote::new().with_rows(
        tables::PRODUCTS,
        vec![
            json!({"id": "p1", "slug": "velvet-lipstick", "name": "Velvet Lipstick",
                   "brand": "Neemon", "category": "makeup", "price": 1450, "stock": 4, "is_active": true,
                   "created_at": "2025-01-05T09:00:00Z"}),
            json!({"id": "p2", "slug": "argan-oil", "name": "Argan Oil",
                   "brand": "Neemon", "category": "hair", "price": 2200, "stock": 30, "is_active": true,
                   "created_at": "2025-01-06T09:00:00Z"}),
            json!({"id": "p3", "slug": "shea-butter", "name": "Shea Butter",
                   "brand": "Neemon", "category": "skincare", "price": 900, "stock": 2,
                   "is_active": false, "created_at": "2025-01-07T09:00:00Z"}),
        ],
    ))
}

/// A tab with local identity and no payment delay.
#[must_use]
pub fn storefront_over(store: Arc<dyn LocalStore>, remote: Arc<MemoryRemote>) -> Storefront {
    let mut options = StorefrontOptions::default();
    options.payment_delays.submit = std::time::Duration::ZERO;
    options.payment_delays.confirm = std::time::Duration::ZERO;
    Storefront::new(store, remote, IdentityBacking::Local, options)
}

/// A fresh tab over an in-memory local store.
#[must_use]
pub fn storefront(remote: Arc<MemoryRemote>) -> Storefront {
    storefront_over(Arc::new(MemoryStore::new()), remote)
}

/// Send one JSON request and decode the JSON response (`Null` if none).
///
/// # Errors
///
/// Returns an error if the request cannot be built or the body read.
pub async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> Result<(StatusCode, Value), BoxError> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))?;
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Ok((status, value))
}
