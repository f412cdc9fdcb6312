//! Dashboard route handler.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::Result;
use crate::services::DashboardStats;
use crate::state::AppState;

/// GET /api/dashboard
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<DashboardStats>> {
    Ok(Json(state.dashboard().stats().await?))
}
