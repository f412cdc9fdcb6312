//! Order management.
//!
//! Any status may be set from any status. The nominal flow documented on
//! [`OrderStatus`] is a convention for sellers, not something enforced here.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, instrument};

use neemon_core::remote::{Filter, Query, RemoteStore, select_as, tables};
use neemon_core::{Order, OrderId, OrderStatus, UserId};

use crate::error::{AppError, Result};

/// Outcome of a status update.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub order: Order,
    pub previous: OrderStatus,
}

/// Reads and updates rows of the `orders` table.
#[derive(Clone)]
pub struct OrderService {
    remote: Arc<dyn RemoteStore>,
}

impl OrderService {
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self { remote }
    }

    /// All orders, newest first, optionally restricted to one status.
    ///
    /// # Errors
    ///
    /// Returns the remote store's error.
    #[instrument(skip(self))]
    pub async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<Order>> {
        let mut query = Query::from(tables::ORDERS).order("created_at", false);
        if let Some(status) = status {
            query = query.eq("status", status.as_str());
        }
        Ok(select_as(self.remote.as_ref(), &query).await?)
    }

    /// The `n` most recent orders.
    ///
    /// # Errors
    ///
    /// Returns the remote store's error.
    pub async fn recent(&self, n: usize) -> Result<Vec<Order>> {
        let query = Query::from(tables::ORDERS)
            .order("created_at", false)
            .limit(n);
        Ok(select_as(self.remote.as_ref(), &query).await?)
    }

    /// Orders placed by one user, newest first.
    ///
    /// This is a filter, not an access check.
    ///
    /// # Errors
    ///
    /// Returns the remote store's error.
    #[instrument(skip(self))]
    pub async fn for_user(&self, user_id: &UserId) -> Result<Vec<Order>> {
        let query = Query::from(tables::ORDERS)
            .eq("user_id", user_id.as_str())
            .order("created_at", false);
        Ok(select_as(self.remote.as_ref(), &query).await?)
    }

    /// One order by id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no row has this id.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &OrderId) -> Result<Order> {
        let query = Query::from(tables::ORDERS).eq("id", id.as_str()).limit(1);
        select_as::<Order, _>(self.remote.as_ref(), &query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("order {id}")))
    }

    /// Set an order's status.
    ///
    /// Logs the customer notice that would be texted to the order's contact
    /// phone.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for an unknown order, or the remote
    /// store's error if the update fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn set_status(&self, id: &OrderId, status: OrderStatus) -> Result<StatusChange> {
        let mut order = self.get(id).await?;
        self.remote
            .update(
                tables::ORDERS,
                json!({ "status": status.as_str() }),
                &[Filter::eq("id", id.as_str())],
            )
            .await?;

        let previous = order.status;
        order.status = status;
        info!(
            phone = order.contact_phone().unwrap_or("unknown"),
            from = %previous,
            "Customer notice: order #{} status changed to {}",
            order.id.short(),
            status,
        );
        Ok(StatusChange { order, previous })
    }
}
