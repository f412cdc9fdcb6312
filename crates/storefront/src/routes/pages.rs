//! Page data for the launch page and the gated shop pages.
//!
//! Rendering happens elsewhere; these handlers return what a page needs.
//! Access to the gated ones is decided by the launch gate middleware.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::instrument;

use neemon_core::{Category, Product};

use crate::error::{AppError, Result};
use crate::state::Storefront;

const COMING_SOON: &str = "Our full beauty collection is launching soon";

/// Page payload.
#[derive(Debug, Serialize)]
pub struct PageView {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub products: Vec<Product>,
}

impl PageView {
    fn notice(title: &str, message: &'static str) -> Json<Self> {
        Json(Self {
            title: title.to_owned(),
            message: Some(message),
            products: Vec::new(),
        })
    }

    fn listing(title: String, products: Vec<Product>) -> Json<Self> {
        Json(Self {
            title,
            message: None,
            products,
        })
    }
}

/// GET /launch
pub async fn launch() -> Json<PageView> {
    PageView::notice(
        "Launching soon",
        "Join the list and be the first to know when we open.",
    )
}

/// GET /shop
pub async fn shop() -> Json<PageView> {
    PageView::notice("Shop", COMING_SOON)
}

/// GET /offers
pub async fn offers() -> Json<PageView> {
    PageView::notice("Offers", COMING_SOON)
}

/// GET /shade-quiz
pub async fn shade_quiz() -> Json<PageView> {
    PageView::notice(
        "Find Your Shade",
        "Recommended: medium coverage, oil-control foundations for Nairobi weather.",
    )
}

/// GET /category/{slug}
#[instrument(skip(storefront))]
pub async fn category(
    State(storefront): State<Storefront>,
    Path(slug): Path<String>,
) -> Result<Json<PageView>> {
    let category: Category = slug
        .parse()
        .map_err(|e: neemon_core::ParseEnumError| AppError::NotFound(e.to_string()))?;
    let products = storefront.catalog().products_by_category(category).await;
    Ok(PageView::listing(category.to_string(), products))
}

/// GET /preview-shop
#[instrument(skip(storefront))]
pub async fn preview_shop(State(storefront): State<Storefront>) -> Json<PageView> {
    PageView::listing("Preview".to_owned(), storefront.catalog().products().await)
}
