//! Order management route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use neemon_core::{Order, OrderId, OrderStatus, UserId};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Filter query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    /// `ALL` or a status (`NEW`, `WITH_RIDER`, `with rider`...).
    pub status: Option<String>,
    pub user_id: Option<String>,
}

/// Order row with display fields.
#[derive(Debug, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub reference: String,
    pub status_label: String,
    pub total_label: String,
    pub item_count: u32,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            reference: order.id.short().to_owned(),
            status_label: order.status.label(),
            total_label: order.total_price().to_string(),
            item_count: order.unit_count(),
            order,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: OrderStatus,
}

/// Response to a status change.
#[derive(Debug, Serialize)]
pub struct StatusChanged {
    pub order: OrderView,
    pub previous: OrderStatus,
}

fn parse_status_filter(raw: Option<&str>) -> Result<Option<OrderStatus>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("all") => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|e: neemon_core::ParseEnumError| AppError::BadRequest(e.to_string())),
    }
}

fn order_id(raw: &str) -> Result<OrderId> {
    OrderId::parse(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}

/// GET /api/orders
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<Vec<OrderView>>> {
    let orders = match filter.user_id.as_deref() {
        Some(user_id) => {
            let user_id = UserId::parse(user_id).map_err(|e| AppError::BadRequest(e.to_string()))?;
            let status = parse_status_filter(filter.status.as_deref())?;
            state
                .orders()
                .for_user(&user_id)
                .await?
                .into_iter()
                .filter(|o| status.is_none_or(|s| o.status == s))
                .collect()
        }
        None => {
            state
                .orders()
                .list(parse_status_filter(filter.status.as_deref())?)
                .await?
        }
    };
    Ok(Json(orders.into_iter().map(OrderView::from).collect()))
}

/// GET /api/orders/{id}
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<OrderView>> {
    let order = state.orders().get(&order_id(&id)?).await?;
    Ok(Json(order.into()))
}

/// POST /api/orders/{id}/status
#[instrument(skip(state, form), fields(status = %form.status))]
pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<StatusForm>,
) -> Result<Json<StatusChanged>> {
    let change = state
        .orders()
        .set_status(&order_id(&id)?, form.status)
        .await?;
    Ok(Json(StatusChanged {
        order: change.order.into(),
        previous: change.previous,
    }))
}
