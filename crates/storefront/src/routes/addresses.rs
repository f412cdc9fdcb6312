//! Saved address handlers. All require a signed-in user.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use neemon_core::AddressId;

use crate::error::{AppError, Result};
use crate::services::addresses::SavedAddress;
use crate::state::Storefront;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressForm {
    pub label: String,
    pub address_text: String,
}

/// GET /api/addresses
pub async fn index(State(storefront): State<Storefront>) -> Result<Json<Vec<SavedAddress>>> {
    let user = storefront.account().require_user()?;
    Ok(Json(storefront.addresses().list(&user.id)))
}

/// POST /api/addresses
#[instrument(skip(storefront, form))]
pub async fn create(
    State(storefront): State<Storefront>,
    Json(form): Json<AddressForm>,
) -> Result<(StatusCode, Json<SavedAddress>)> {
    let user = storefront.account().require_user()?;
    let saved = storefront
        .addresses()
        .add(&user.id, &form.label, &form.address_text)?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// DELETE /api/addresses/{id}
#[instrument(skip(storefront))]
pub async fn delete(
    State(storefront): State<Storefront>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let user = storefront.account().require_user()?;
    let id = AddressId::parse(&id).map_err(|e| AppError::BadRequest(e.to_string()))?;
    storefront.addresses().remove(&user.id, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
