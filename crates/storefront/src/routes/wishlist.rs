//! Wishlist route handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use neemon_core::ProductId;

use crate::error::{AppError, Result};
use crate::state::Storefront;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistRequest {
    pub product_id: String,
}

impl WishlistRequest {
    fn product_id(&self) -> Result<ProductId> {
        ProductId::parse(&self.product_id).map_err(|e| AppError::BadRequest(e.to_string()))
    }
}

#[derive(Debug, Serialize)]
pub struct WishlistView {
    pub ids: Vec<ProductId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub in_wishlist: bool,
    pub ids: Vec<ProductId>,
}

fn view(storefront: &Storefront) -> Json<WishlistView> {
    Json(WishlistView {
        ids: storefront.wishlist().ids(),
    })
}

/// GET /api/wishlist
pub async fn show(State(storefront): State<Storefront>) -> Json<WishlistView> {
    view(&storefront)
}

/// POST /api/wishlist/toggle
#[instrument(skip(storefront))]
pub async fn toggle(
    State(storefront): State<Storefront>,
    Json(request): Json<WishlistRequest>,
) -> Result<Json<ToggleResponse>> {
    let in_wishlist = storefront.wishlist().toggle(&request.product_id()?)?;
    Ok(Json(ToggleResponse {
        in_wishlist,
        ids: storefront.wishlist().ids(),
    }))
}

/// POST /api/wishlist/remove
#[instrument(skip(storefront))]
pub async fn remove(
    State(storefront): State<Storefront>,
    Json(request): Json<WishlistRequest>,
) -> Result<Json<WishlistView>> {
    storefront.wishlist().remove(&request.product_id()?)?;
    Ok(view(&storefront))
}

/// POST /api/wishlist/move-to-cart
#[instrument(skip(storefront))]
pub async fn move_to_cart(
    State(storefront): State<Storefront>,
    Json(request): Json<WishlistRequest>,
) -> Result<Json<WishlistView>> {
    storefront
        .wishlist()
        .move_to_cart(storefront.cart(), &request.product_id()?)?;
    Ok(view(&storefront))
}
