//! Checkout handler.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use tracing::instrument;

use neemon_core::Order;

use crate::error::{Result, add_breadcrumb};
use crate::services::checkout::CheckoutRequest;
use crate::state::Storefront;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub order: Order,
    pub total_label: String,
    /// Reference shown on the confirmation screen.
    pub reference: String,
}

/// POST /api/checkout
///
/// Responds once the order row is stored. With M-Pesa this includes the
/// simulated payment delay.
#[instrument(skip(storefront, request))]
pub async fn place_order(
    State(storefront): State<Storefront>,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<PlacedOrder>)> {
    add_breadcrumb("checkout", "Order submitted", None);
    let order = storefront.place_order(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(PlacedOrder {
            total_label: order.total_price().to_string(),
            reference: order.id.short().to_owned(),
            order,
        }),
    ))
}
