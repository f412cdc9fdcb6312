//! Product route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use neemon_core::{Category, Product, ProductId};

use crate::error::{AppError, Result};
use crate::services::reviews::Review;
use crate::state::Storefront;

/// Listing filters.
#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub category: Option<String>,
}

/// Product detail with its reviews.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub price_label: String,
    pub in_wishlist: bool,
    pub reviews: Vec<Review>,
}

fn parse_category(slug: &str) -> Result<Category> {
    slug.parse::<Category>()
        .map_err(|e| AppError::NotFound(e.to_string()))
}

/// GET /api/products
#[instrument(skip(storefront))]
pub async fn index(
    State(storefront): State<Storefront>,
    Query(query): Query<ProductsQuery>,
) -> Result<Json<Vec<Product>>> {
    let products = match query.category.as_deref() {
        Some(slug) => {
            storefront
                .catalog()
                .products_by_category(parse_category(slug)?)
                .await
        }
        None => storefront.catalog().products().await,
    };
    Ok(Json(products))
}

/// GET /api/products/category/{slug}
#[instrument(skip(storefront))]
pub async fn category(
    State(storefront): State<Storefront>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<Product>>> {
    let category = parse_category(&slug)?;
    Ok(Json(storefront.catalog().products_by_category(category).await))
}

/// GET /api/products/{slug}
#[instrument(skip(storefront))]
pub async fn show(
    State(storefront): State<Storefront>,
    Path(slug): Path<String>,
) -> Result<Json<ProductDetail>> {
    let product = storefront
        .catalog()
        .product_by_slug(&slug)
        .await
        .ok_or_else(|| AppError::NotFound(format!("product {slug}")))?;
    Ok(Json(detail(&storefront, product)))
}

fn detail(storefront: &Storefront, product: Product) -> ProductDetail {
    let reviews = storefront.reviews().for_product(&product.id);
    ProductDetail {
        price_label: product.unit_price().to_string(),
        in_wishlist: storefront.wishlist().contains(&product.id),
        reviews,
        product,
    }
}

/// GET /api/products/id/{id}
#[instrument(skip(storefront))]
pub async fn by_id(
    State(storefront): State<Storefront>,
    Path(id): Path<String>,
) -> Result<Json<ProductDetail>> {
    let id = ProductId::parse(&id).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let product = storefront
        .catalog()
        .product(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    Ok(Json(detail(&storefront, product)))
}
