//! A shopper's session driven entirely through the storefront's JSON surface.

#![allow(clippy::unwrap_used)]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use neemon_core::remote::tables;
use neemon_integration_tests::{call, seeded_remote, storefront};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_signup_shop_and_checkout() {
    let remote = seeded_remote();
    let app = neemon_storefront::routes::app(storefront(remote.clone()));

    let (status, user) = call(
        &app,
        Method::POST,
        "/api/account/signup",
        Some(json!({"name": "Amina W", "email": "amina@example.com",
                    "phone": "0712345678", "password": "hunter22"})),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::OK);

    let (_, products) = call(&app, Method::GET, "/api/products?category=makeup", None)
        .await
        .unwrap();
    assert_eq!(products.as_array().unwrap().len(), 1);

    call(&app, Method::POST, "/api/cart/add", Some(json!({"productId": "p1", "qty": 2})))
        .await
        .unwrap();
    call(&app, Method::POST, "/api/cart/add", Some(json!({"productId": "p2"})))
        .await
        .unwrap();
    let (_, cart) = call(&app, Method::GET, "/api/cart", None).await.unwrap();
    assert_eq!(cart["count"], 3);
    assert_eq!(cart["subtotal"], "KES 5,100");

    let (status, placed) = call(
        &app,
        Method::POST,
        "/api/checkout",
        Some(json!({
            "method": "courier",
            "location": {"latitude": -1.2921, "longitude": 36.8219,
                         "addressLabel": "Pinned location", "deliveryMethod": "courier"},
            "payment": "delivery",
        })),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(placed["totalLabel"], "KES 5,100");
    assert_eq!(placed["order"]["user_id"], user["id"]);

    let (_, cart) = call(&app, Method::GET, "/api/cart", None).await.unwrap();
    assert_eq!(cart["count"], 0);

    let rows = remote.rows(tables::ORDERS);
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0]["items"],
        json!([{"productId": "p1", "qty": 2}, {"productId": "p2", "qty": 1}])
    );
}

#[tokio::test]
async fn test_account_errors_map_to_statuses() {
    let app = neemon_storefront::routes::app(storefront(seeded_remote()));
    let signup = json!({"name": "Amina W", "email": "a@x.com", "password": "hunter22"});
    call(&app, Method::POST, "/api/account/signup", Some(signup))
        .await
        .unwrap();

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/account/signup",
        Some(json!({"name": "Other", "email": "A@x.com", "password": "secret99"})),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/account/login",
        Some(json!({"email": "a@x.com", "password": "nope"})),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    call(&app, Method::POST, "/api/account/logout", None)
        .await
        .unwrap();
    let (status, _) = call(&app, Method::GET, "/api/addresses", None)
        .await
        .unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reviews_need_sign_in_and_show_publicly() {
    let app = neemon_storefront::routes::app(storefront(seeded_remote()));
    let review = json!({"productId": "p1", "rating": 5, "text": "Lasts all day."});

    let (status, _) = call(&app, Method::POST, "/api/reviews", Some(review.clone()))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    call(
        &app,
        Method::POST,
        "/api/account/signup",
        Some(json!({"name": "Amina W", "email": "amina@example.com", "password": "hunter22"})),
    )
    .await
    .unwrap();
    let (status, _) = call(&app, Method::POST, "/api/reviews", Some(review))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::CREATED);

    let (_, listed) = call(&app, Method::GET, "/api/reviews/product/p1", None)
        .await
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["rating"], 5);
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Option<String>) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_owned());
    (response.status(), location)
}

#[tokio::test]
async fn test_launch_gate() {
    let app = neemon_storefront::routes::app(storefront(seeded_remote()));

    let (status, location) = get(&app, "/category/makeup?sort=new").await;
    assert!(status.is_redirection());
    assert_eq!(location.as_deref(), Some("/launch"));

    let (status, _) = get(&app, "/preview-shop?key=wrong").await;
    assert!(status.is_redirection());
    let (status, _) = get(&app, "/preview-shop?key=NEEMONPREVIEW").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get(&app, "/launch").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get(&app, "/api/products").await;
    assert_eq!(status, StatusCode::OK);
}
