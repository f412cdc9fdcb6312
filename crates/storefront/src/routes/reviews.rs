//! Review handlers.
//!
//! Reading a product's reviews is public; writing requires sign-in.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use neemon_core::{ProductId, ReviewId};

use crate::error::{AppError, Result};
use crate::services::reviews::Review;
use crate::state::Storefront;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewForm {
    pub product_id: String,
    pub rating: u8,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct EditReviewForm {
    pub text: String,
}

fn review_id(raw: &str) -> Result<ReviewId> {
    ReviewId::parse(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}

/// GET /api/reviews
pub async fn mine(State(storefront): State<Storefront>) -> Result<Json<Vec<Review>>> {
    let user = storefront.account().require_user()?;
    Ok(Json(storefront.reviews().mine(&user.id)))
}

/// GET /api/reviews/product/{product_id}
pub async fn for_product(
    State(storefront): State<Storefront>,
    Path(product_id): Path<String>,
) -> Result<Json<Vec<Review>>> {
    let product_id =
        ProductId::parse(&product_id).map_err(|e| AppError::BadRequest(e.to_string()))?;
    Ok(Json(storefront.reviews().for_product(&product_id)))
}

/// POST /api/reviews
#[instrument(skip(storefront, form), fields(product_id = %form.product_id, rating = form.rating))]
pub async fn create(
    State(storefront): State<Storefront>,
    Json(form): Json<ReviewForm>,
) -> Result<(StatusCode, Json<Review>)> {
    let user = storefront.account().require_user()?;
    let product_id =
        ProductId::parse(&form.product_id).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let review = storefront
        .reviews()
        .add(&user.id, &product_id, form.rating, &form.text)?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// PATCH /api/reviews/{id}
#[instrument(skip(storefront, form))]
pub async fn edit(
    State(storefront): State<Storefront>,
    Path(id): Path<String>,
    Json(form): Json<EditReviewForm>,
) -> Result<Json<Review>> {
    let user = storefront.account().require_user()?;
    let review = storefront
        .reviews()
        .edit_text(&user.id, &review_id(&id)?, &form.text)?;
    Ok(Json(review))
}

/// DELETE /api/reviews/{id}
#[instrument(skip(storefront))]
pub async fn delete(
    State(storefront): State<Storefront>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let user = storefront.account().require_user()?;
    storefront.reviews().delete(&user.id, &review_id(&id)?)?;
    Ok(StatusCode::NO_CONTENT)
}
