//! A shopper's order travels from the storefront cart to the seller's
//! dashboard and back out with a new status.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use neemon_admin::AppState;
use neemon_core::remote::tables;
use neemon_core::{DeliveryMethod, OrderStatus, PaymentMode, ProductId};
use neemon_integration_tests::{call, seeded_remote, storefront};
use neemon_storefront::services::auth::SignupRequest;
use neemon_storefront::services::checkout::{CheckoutError, CheckoutRequest};
use serde_json::json;

fn pid(raw: &str) -> ProductId {
    ProductId::parse(raw).unwrap()
}

fn pay_on_delivery(address: &str) -> CheckoutRequest {
    CheckoutRequest {
        method: DeliveryMethod::Bodaboda,
        address_text: Some(address.to_owned()),
        location: None,
        payment: PaymentMode::Delivery,
        mpesa_phone: None,
    }
}

#[tokio::test]
async fn test_signed_in_order_reaches_admin() {
    let remote = seeded_remote();
    let shopper = storefront(remote.clone());
    let user = shopper
        .account()
        .signup(SignupRequest::new("Amina W", "amina@example.com", "0712345678", "hunter22").unwrap())
        .await
        .unwrap();

    shopper.cart().add_item(&pid("p1"), 2.0).unwrap();
    shopper.cart().add_item(&pid("p2"), 1.0).unwrap();
    let before = shopper.cart().lines();

    let order = shopper
        .place_order(pay_on_delivery("Kilimani, Nairobi"))
        .await
        .unwrap();
    assert!(shopper.cart().is_empty());
    assert_eq!(order.items, before);
    assert_eq!(order.user_id.as_ref(), Some(&user.id));

    let admin = AppState::with_defaults(remote.clone());
    let listed = admin.orders().list(None).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, order.id);
    assert_eq!(listed[0].status, OrderStatus::New);
    assert_eq!(listed[0].customer_email.as_deref(), Some("amina@example.com"));
    assert_eq!(admin.orders().for_user(&user.id).await.unwrap().len(), 1);

    let stats = admin
        .dashboard()
        .stats_since(Utc::now() - Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(stats.new_orders, 1);
    assert_eq!(stats.sales_today_label, "KES 5,100");
    // p1 (4 left) and the hidden p3 (2 left)
    assert_eq!(stats.low_stock, 2);
    assert_eq!(stats.recent_orders.len(), 1);
}

#[tokio::test]
async fn test_admin_status_change_over_http() {
    let remote = seeded_remote();
    let shopper = storefront(remote.clone());
    shopper.cart().add_item(&pid("p2"), 1.0).unwrap();
    let order = shopper
        .place_order(pay_on_delivery("Westlands"))
        .await
        .unwrap();
    assert!(order.user_id.is_none());

    let app = neemon_admin::routes::app(AppState::with_defaults(remote.clone()));
    let uri = format!("/api/orders/{}/status", order.id);
    let (status, body) = call(&app, Method::POST, &uri, Some(json!({"status": "WITH_RIDER"})))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["previous"], "NEW");
    assert_eq!(body["order"]["status_label"], "WITH RIDER");

    let (_, listed) = call(&app, Method::GET, "/api/orders?status=NEW", None)
        .await
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 0);

    // Any status may follow any other.
    let (status, _) = call(&app, Method::POST, &uri, Some(json!({"status": "NEW"})))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(remote.rows(tables::ORDERS)[0]["status"], "NEW");
}

#[tokio::test]
async fn test_rejected_insert_keeps_cart() {
    let remote = seeded_remote();
    let shopper = storefront(remote.clone());
    shopper.cart().add_item(&pid("p1"), 3.0).unwrap();

    remote.fail_next("new row violates row-level security policy");
    let err = shopper
        .place_order(pay_on_delivery("Kileleshwa"))
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::Remote(_)));
    assert_eq!(err.to_string(), "new row violates row-level security policy");
    assert_eq!(shopper.cart().count(), 3);
    assert!(remote.rows(tables::ORDERS).is_empty());
}

#[tokio::test]
async fn test_missing_delivery_info_makes_no_insert() {
    let remote = seeded_remote();
    let shopper = storefront(remote.clone());
    shopper.cart().add_item(&pid("p1"), 1.0).unwrap();

    let err = shopper.place_order(pay_on_delivery("   ")).await.unwrap_err();
    assert!(matches!(err, CheckoutError::MissingDeliveryInfo));
    assert_eq!(remote.insert_calls(), 0);
    assert_eq!(shopper.cart().count(), 1);
}

#[tokio::test]
async fn test_hidden_product_leaves_listing_but_stays_in_admin() {
    let remote = seeded_remote();
    let admin = AppState::with_defaults(remote.clone());
    let shopper = storefront(remote.clone());

    assert_eq!(shopper.catalog().products().await.len(), 2);
    assert_eq!(admin.products().list().await.unwrap().len(), 3);

    let toggled = admin.products().toggle_active(&pid("p3")).await.unwrap();
    assert!(toggled.is_active);
    // A fresh tab bypasses the first tab's catalog cache.
    let fresh = storefront(remote);
    assert_eq!(fresh.catalog().products().await.len(), 3);
}
