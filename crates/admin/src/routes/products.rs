//! Product management route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use tracing::instrument;

use neemon_core::{Product, ProductDraft, ProductId};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Product row with display fields.
#[derive(Debug, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub price_label: String,
    pub low_stock: bool,
}

fn view(product: Product, threshold: i32) -> ProductView {
    ProductView {
        price_label: product.unit_price().to_string(),
        low_stock: product.is_low_stock(threshold),
        product,
    }
}

fn product_id(raw: &str) -> Result<ProductId> {
    ProductId::parse(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}

/// GET /api/products
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<ProductView>>> {
    let threshold = state.low_stock_threshold();
    let products = state.products().list().await?;
    Ok(Json(products.into_iter().map(|p| view(p, threshold)).collect()))
}

/// POST /api/products
#[instrument(skip(state, draft))]
pub async fn create(
    State(state): State<AppState>,
    Json(draft): Json<ProductDraft>,
) -> Result<(StatusCode, Json<ProductView>)> {
    let product = state.products().create(draft).await?;
    Ok((
        StatusCode::CREATED,
        Json(view(product, state.low_stock_threshold())),
    ))
}

/// GET /api/products/{id}
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductView>> {
    let product = state.products().get(&product_id(&id)?).await?;
    Ok(Json(view(product, state.low_stock_threshold())))
}

/// PUT /api/products/{id}
#[instrument(skip(state, draft))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<ProductDraft>,
) -> Result<Json<ProductView>> {
    let product = state.products().update(&product_id(&id)?, draft).await?;
    Ok(Json(view(product, state.low_stock_threshold())))
}

/// POST /api/products/{id}/toggle
#[instrument(skip(state))]
pub async fn toggle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductView>> {
    let product = state.products().toggle_active(&product_id(&id)?).await?;
    Ok(Json(view(product, state.low_stock_threshold())))
}
