//! Cart route handlers.
//!
//! Quantities arrive as loose JSON (numbers or numeric strings) and are
//! normalized by the cart itself: add coerces to at least 1, set floors and
//! removes at zero, anything non-numeric on set is ignored.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use neemon_core::{CartLine, Price, Product, ProductId, total_units};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::services::cart::numeric;
use crate::state::Storefront;

/// One cart line joined with its product.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub product_id: ProductId,
    pub qty: u32,
    /// `None` when the product is no longer in the catalog.
    pub product: Option<Product>,
    pub line_price: Option<String>,
}

/// Cart display data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub count: u32,
    pub subtotal: String,
}

impl CartView {
    pub async fn build(storefront: &Storefront, lines: Vec<CartLine>) -> Self {
        let count = total_units(&lines);
        let mut subtotal = Decimal::ZERO;
        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            let product = storefront.catalog().product(&line.product_id).await;
            let line_price = product.as_ref().map(|p| p.unit_price().times(line.qty));
            if let Some(price) = line_price {
                subtotal += price.amount;
            }
            items.push(CartItemView {
                product_id: line.product_id,
                qty: line.qty,
                product,
                line_price: line_price.map(|p| p.to_string()),
            });
        }
        Self {
            items,
            count,
            subtotal: Price::kes(subtotal).to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRequest {
    pub product_id: String,
    #[serde(default)]
    pub qty: Option<Value>,
}

impl CartItemRequest {
    fn product_id(&self) -> Result<ProductId> {
        ProductId::parse(&self.product_id).map_err(|e| AppError::BadRequest(e.to_string()))
    }
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u32,
}

async fn current(storefront: &Storefront) -> Json<CartView> {
    Json(CartView::build(storefront, storefront.cart().lines()).await)
}

/// GET /api/cart
#[instrument(skip(storefront))]
pub async fn show(State(storefront): State<Storefront>) -> Json<CartView> {
    current(&storefront).await
}

/// GET /api/cart/count
pub async fn count(State(storefront): State<Storefront>) -> Json<CountResponse> {
    Json(CountResponse {
        count: storefront.cart().count(),
    })
}

/// POST /api/cart/add
#[instrument(skip(storefront))]
pub async fn add(
    State(storefront): State<Storefront>,
    Json(request): Json<CartItemRequest>,
) -> Result<Json<CartView>> {
    let product_id = request.product_id()?;
    let qty = request.qty.as_ref().map_or(Some(1.0), numeric).unwrap_or(f64::NAN);
    storefront.cart().add_item(&product_id, qty)?;
    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product_id.as_str())]));
    Ok(current(&storefront).await)
}

/// POST /api/cart/update
#[instrument(skip(storefront))]
pub async fn update(
    State(storefront): State<Storefront>,
    Json(request): Json<CartItemRequest>,
) -> Result<Json<CartView>> {
    let product_id = request.product_id()?;
    let qty = request.qty.as_ref().and_then(numeric).unwrap_or(f64::NAN);
    storefront.cart().set_qty(&product_id, qty)?;
    Ok(current(&storefront).await)
}

/// POST /api/cart/remove
#[instrument(skip(storefront))]
pub async fn remove(
    State(storefront): State<Storefront>,
    Json(request): Json<CartItemRequest>,
) -> Result<Json<CartView>> {
    storefront.cart().remove_item(&request.product_id()?)?;
    Ok(current(&storefront).await)
}

/// POST /api/cart/clear
#[instrument(skip(storefront))]
pub async fn clear(State(storefront): State<Storefront>) -> Result<Json<CartView>> {
    storefront.cart().clear()?;
    Ok(current(&storefront).await)
}

/// POST /api/cart/save-for-later
#[instrument(skip(storefront))]
pub async fn save_for_later(
    State(storefront): State<Storefront>,
    Json(request): Json<CartItemRequest>,
) -> Result<Json<CartView>> {
    let product_id = request.product_id()?;
    storefront
        .wishlist()
        .save_for_later(storefront.cart(), &product_id)?;
    Ok(current(&storefront).await)
}
