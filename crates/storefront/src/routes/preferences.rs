//! Delivery location, theme and launch-notify handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use neemon_core::{DeliveryLocation, DeliveryMethod, Theme};

use crate::error::Result;
use crate::state::Storefront;

#[derive(Debug, Serialize)]
pub struct ThemeBody {
    pub theme: Theme,
}

#[derive(Debug, Deserialize)]
pub struct ThemeForm {
    pub theme: Theme,
}

#[derive(Debug, Deserialize)]
pub struct NotifyForm {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct NotifyResponse {
    pub added: bool,
}

/// GET /api/delivery-location
///
/// Falls back to the default map centre for bodaboda delivery when nothing
/// was selected yet.
pub async fn delivery_location(State(storefront): State<Storefront>) -> Json<DeliveryLocation> {
    Json(
        storefront
            .preferences()
            .delivery_location()
            .unwrap_or_else(|| DeliveryLocation::default_for(DeliveryMethod::Bodaboda)),
    )
}

/// PUT /api/delivery-location
#[instrument(skip(storefront))]
pub async fn set_delivery_location(
    State(storefront): State<Storefront>,
    Json(location): Json<DeliveryLocation>,
) -> Result<Json<DeliveryLocation>> {
    storefront
        .preferences()
        .set_delivery_location(location.clone())?;
    Ok(Json(location))
}

/// GET /api/theme
pub async fn theme(State(storefront): State<Storefront>) -> Json<ThemeBody> {
    Json(ThemeBody {
        theme: storefront.preferences().theme(),
    })
}

/// PUT /api/theme
pub async fn set_theme(
    State(storefront): State<Storefront>,
    Json(form): Json<ThemeForm>,
) -> Result<Json<ThemeBody>> {
    storefront.preferences().set_theme(form.theme)?;
    Ok(Json(ThemeBody { theme: form.theme }))
}

/// POST /api/notify
#[instrument(skip(storefront, form))]
pub async fn notify(
    State(storefront): State<Storefront>,
    Json(form): Json<NotifyForm>,
) -> Result<(StatusCode, Json<NotifyResponse>)> {
    let added = storefront.preferences().add_notify_email(&form.email)?;
    let status = if added { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(NotifyResponse { added })))
}
