//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness
//! GET  /health/ready               - Remote store reachable
//!
//! # Dashboard
//! GET  /api/dashboard              - New orders, sales today, low stock, recent orders
//!
//! # Orders
//! GET  /api/orders[?status=&user_id=]
//! GET  /api/orders/{id}
//! POST /api/orders/{id}/status     - {status}; any status to any status
//!
//! # Products
//! GET  /api/products               - All products, hidden included
//! POST /api/products
//! GET  /api/products/{id}
//! PUT  /api/products/{id}
//! POST /api/products/{id}/toggle   - Flip is_active
//! ```
//!
//! The admin binary binds to localhost and carries no login of its own;
//! access control is the network boundary in front of it.

pub mod dashboard;
pub mod orders;
pub mod products;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use neemon_core::remote::{Query, tables};

use crate::state::AppState;

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", post(orders::set_status))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/{id}", get(products::show).put(products::update))
        .route("/{id}/toggle", post(products::toggle))
}

/// Create all routes for the admin surface.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/api/dashboard", get(dashboard::index))
        .nest("/api/orders", order_routes())
        .nest("/api/products", product_routes())
}

/// The admin app with state applied. Tracing and Sentry layers are added by
/// the binary.
pub fn app(state: AppState) -> Router {
    routes().with_state(state)
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the remote store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state
        .remote()
        .count(&Query::from(tables::ORDERS).limit(1))
        .await
    {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
