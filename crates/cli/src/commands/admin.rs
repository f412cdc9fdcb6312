//! Seller commands.
//!
//! # Usage
//!
//! ```bash
//! neemon admin orders --status NEW
//! neemon admin status ORD-1a2b3c4d-... WITH_RIDER
//! neemon admin dashboard
//! ```
//!
//! # Environment Variables
//!
//! - `SUPABASE_URL` - Supabase project URL
//! - `SUPABASE_SERVICE_KEY` - Service-role key

use neemon_admin::AppState;
use neemon_admin::error::{AppError, Result};
use neemon_admin::routes::orders::OrderView;
use neemon_admin::services::DashboardStats;
use neemon_core::{OrderId, OrderStatus};

/// Orders, newest first, optionally for one status.
///
/// # Errors
///
/// Returns the remote store's error.
pub async fn orders(state: &AppState, status: Option<OrderStatus>) -> Result<Vec<OrderView>> {
    let orders = state.orders().list(status).await?;
    Ok(orders.into_iter().map(OrderView::from).collect())
}

/// Set an order's status. Any status may follow any other.
///
/// # Errors
///
/// Returns `NotFound` for an unknown order or the remote store's error.
pub async fn set_status(state: &AppState, id: &str, status: OrderStatus) -> Result<OrderView> {
    let id = OrderId::parse(id).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let change = state.orders().set_status(&id, status).await?;
    tracing::info!(
        order = change.order.id.short(),
        from = %change.previous,
        to = %status,
        "Status updated"
    );
    Ok(change.order.into())
}

/// Dashboard counters.
///
/// # Errors
///
/// Returns the remote store's error.
pub async fn dashboard(state: &AppState) -> Result<DashboardStats> {
    state.dashboard().stats().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use neemon_core::remote::{MemoryRemote, tables};
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_set_status_then_filter() {
        let remote = Arc::new(MemoryRemote::new().with_rows(
            tables::ORDERS,
            vec![json!({
                "id": "ORD-5e6f7a8b-1111",
                "items": [{"productId": "p1", "qty": 1}],
                "total": "1450",
                "status": "NEW",
                "payment": "delivery",
                "method": "courier",
                "created_at": "2025-03-10T08:00:00Z",
            })],
        ));
        let state = AppState::with_defaults(remote);

        let view = set_status(&state, "ORD-5e6f7a8b-1111", OrderStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(view.status_label, "CANCELLED");
        assert!(orders(&state, Some(OrderStatus::New)).await.unwrap().is_empty());
        assert_eq!(
            orders(&state, Some(OrderStatus::Cancelled))
                .await
                .unwrap()
                .len(),
            1
        );
        assert!(matches!(
            set_status(&state, "", OrderStatus::New).await,
            Err(AppError::BadRequest(_))
        ));
    }
}
