//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                       - Liveness
//! GET  /health/ready                 - Remote store reachable
//! GET  /launch                       - Launch page
//!
//! # Gated (see middleware::launch_gate)
//! GET  /shop
//! GET  /category/{slug}
//! GET  /offers
//! GET  /shade-quiz
//! GET  /preview-shop?key=...
//!
//! # Products
//! GET  /api/products[?category=]     - Listed products with stock
//! GET  /api/products/category/{slug}
//! GET  /api/products/id/{id}
//! GET  /api/products/{slug}          - Detail with reviews
//!
//! # Cart
//! GET  /api/cart                     - Lines joined with products
//! GET  /api/cart/count
//! POST /api/cart/add                 - {productId, qty?}
//! POST /api/cart/update              - {productId, qty}
//! POST /api/cart/remove              - {productId}
//! POST /api/cart/clear
//! POST /api/cart/save-for-later      - {productId}
//!
//! # Wishlist
//! GET  /api/wishlist
//! POST /api/wishlist/toggle          - {productId}
//! POST /api/wishlist/remove          - {productId}
//! POST /api/wishlist/move-to-cart    - {productId}
//!
//! # Account
//! GET  /api/account                  - Auth state
//! POST /api/account/signup
//! POST /api/account/login
//! POST /api/account/logout
//! POST /api/account/reset-password
//! PUT  /api/account/profile
//!
//! # Account data (requires sign-in)
//! GET  /api/addresses
//! POST /api/addresses
//! DELETE /api/addresses/{id}
//! GET  /api/reviews
//! POST /api/reviews
//! GET  /api/reviews/product/{id}     - Public
//! PATCH /api/reviews/{id}
//! DELETE /api/reviews/{id}
//!
//! # Preferences
//! GET/PUT /api/delivery-location
//! GET/PUT /api/theme
//! POST /api/notify                   - Launch notification signup
//!
//! # Checkout
//! POST /api/checkout
//! ```

pub mod account;
pub mod addresses;
pub mod cart;
pub mod checkout;
pub mod pages;
pub mod preferences;
pub mod products;
pub mod reviews;
pub mod wishlist;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
};

use neemon_core::remote::{Query, tables};

use crate::middleware::{launch_gate_middleware, request_id_middleware, security_headers_middleware};
use crate::state::Storefront;

/// Create the product routes router.
pub fn product_routes() -> Router<Storefront> {
    Router::new()
        .route("/", get(products::index))
        .route("/category/{slug}", get(products::category))
        .route("/id/{id}", get(products::by_id))
        .route("/{slug}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<Storefront> {
    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/save-for-later", post(cart::save_for_later))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<Storefront> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/toggle", post(wishlist::toggle))
        .route("/remove", post(wishlist::remove))
        .route("/move-to-cart", post(wishlist::move_to_cart))
}

/// Create the account routes router.
pub fn account_routes() -> Router<Storefront> {
    Router::new()
        .route("/", get(account::show))
        .route("/signup", post(account::signup))
        .route("/login", post(account::login))
        .route("/logout", post(account::logout))
        .route("/reset-password", post(account::reset_password))
        .route("/profile", axum::routing::put(account::update_profile))
}

/// Create the review routes router.
pub fn review_routes() -> Router<Storefront> {
    Router::new()
        .route("/", get(reviews::mine).post(reviews::create))
        .route("/product/{product_id}", get(reviews::for_product))
        .route("/{id}", delete(reviews::delete).patch(reviews::edit))
}

/// Create the gated page routes.
pub fn page_routes() -> Router<Storefront> {
    Router::new()
        .route("/launch", get(pages::launch))
        .route("/shop", get(pages::shop))
        .route("/category/{slug}", get(pages::category))
        .route("/offers", get(pages::offers))
        .route("/shade-quiz", get(pages::shade_quiz))
        .route("/preview-shop", get(pages::preview_shop))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<Storefront> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(page_routes())
        .nest("/api/products", product_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/wishlist", wishlist_routes())
        .nest("/api/account", account_routes())
        .route(
            "/api/addresses",
            get(addresses::index).post(addresses::create),
        )
        .route("/api/addresses/{id}", delete(addresses::delete))
        .nest("/api/reviews", review_routes())
        .route(
            "/api/delivery-location",
            get(preferences::delivery_location).put(preferences::set_delivery_location),
        )
        .route(
            "/api/theme",
            get(preferences::theme).put(preferences::set_theme),
        )
        .route("/api/notify", post(preferences::notify))
        .route("/api/checkout", post(checkout::place_order))
}

/// The storefront app with its middleware, ready to serve.
///
/// Sentry and tracing layers are added by the binary.
pub fn app(storefront: Storefront) -> Router {
    routes()
        .layer(from_fn_with_state(storefront.clone(), launch_gate_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .with_state(storefront)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the remote store is not reachable.
async fn readiness(State(storefront): State<Storefront>) -> StatusCode {
    match storefront
        .remote()
        .count(&Query::from(tables::PRODUCTS).limit(1))
        .await
    {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::state::{IdentityBacking, StorefrontOptions};
    use crate::store::MemoryStore;
    use neemon_core::remote::MemoryRemote;

    fn storefront() -> Storefront {
        let remote = MemoryRemote::new().with_rows(
            tables::PRODUCTS,
            vec![json!({"id": "p1", "slug": "velvet-lipstick", "name": "Velvet Lipstick",
                        "brand": "Neemon", "category": "makeup", "price": 1450, "stock": 4})],
        );
        Storefront::new(
            Arc::new(MemoryStore::new()),
            Arc::new(remote),
            IdentityBacking::Local,
            StorefrontOptions::default(),
        )
    }

    async fn call(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_cart_add_then_view() {
        let storefront = storefront();
        let app = app(storefront.clone());

        let (status, body) = call(
            app.clone(),
            Method::POST,
            "/api/cart/add",
            Some(json!({"productId": "p1", "qty": "2"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
        assert_eq!(body["subtotal"], "KES 2,900");
        assert_eq!(body["items"][0]["product"]["name"], "Velvet Lipstick");

        let (_, body) = call(
            app,
            Method::POST,
            "/api/cart/update",
            Some(json!({"productId": "p1", "qty": 0})),
        )
        .await;
        assert_eq!(body["count"], 0);
        assert!(storefront.cart().is_empty());
    }

    #[tokio::test]
    async fn test_cart_view_count_saturates() {
        let storefront = storefront();
        let cart = storefront.cart();
        cart.add_item(&neemon_core::ProductId::parse("p1").unwrap(), f64::from(u32::MAX))
            .unwrap();
        cart.add_item(&neemon_core::ProductId::parse("p2").unwrap(), 1.0)
            .unwrap();

        let (status, body) = call(app(storefront), Method::GET, "/api/cart", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], u32::MAX);
    }

    #[tokio::test]
    async fn test_addresses_require_sign_in() {
        let (status, body) = call(app(storefront()), Method::GET, "/api/addresses", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "not signed in");
    }

    #[tokio::test]
    async fn test_signup_duplicate_is_conflict() {
        let app = app(storefront());
        let form = json!({"name": "Amina", "email": "amina@example.com", "password": "hunter22"});
        let (status, body) = call(app.clone(), Method::POST, "/api/account/signup", Some(form)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "amina@example.com");

        let form = json!({"name": "Amina", "email": "AMINA@example.com", "password": "hunter22"});
        let (status, body) = call(app, Method::POST, "/api/account/signup", Some(form)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Email already registered");
    }

    #[tokio::test]
    async fn test_checkout_without_delivery_info() {
        let storefront = storefront();
        storefront
            .cart()
            .add_item(&neemon_core::ProductId::parse("p1").unwrap(), 1.0)
            .unwrap();
        let (status, body) = call(
            app(storefront),
            Method::POST,
            "/api/checkout",
            Some(json!({"method": "bodaboda", "payment": "delivery", "addressText": " "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Add a text address or select a map location.");
    }

    #[tokio::test]
    async fn test_shop_is_gated_by_default() {
        let response = app(storefront())
            .oneshot(Request::builder().uri("/shop").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    }

    #[tokio::test]
    async fn test_readiness() {
        let (status, _) = call(app(storefront()), Method::GET, "/health/ready", None).await;
        assert_eq!(status, StatusCode::OK);
    }
}
