//! Dashboard overview.

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use neemon_core::remote::{Query, RemoteStore, select_as, tables};
use neemon_core::{Order, OrderStatus, Price};

use super::orders::OrderService;
use super::products::ProductService;
use crate::error::Result;

/// Number of orders shown under "recent orders".
pub const RECENT_ORDERS: usize = 5;

/// Overview counters and the latest orders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub new_orders: u64,
    pub sales_today: Decimal,
    pub sales_today_label: String,
    pub low_stock: u64,
    pub recent_orders: Vec<Order>,
}

#[derive(Deserialize)]
struct TotalRow {
    total: Decimal,
}

/// Computes [`DashboardStats`].
#[derive(Clone)]
pub struct DashboardService {
    remote: Arc<dyn RemoteStore>,
    orders: OrderService,
    products: ProductService,
    low_stock_threshold: i32,
}

impl DashboardService {
    pub fn new(remote: Arc<dyn RemoteStore>, low_stock_threshold: i32) -> Self {
        Self {
            orders: OrderService::new(remote.clone()),
            products: ProductService::new(remote.clone()),
            remote,
            low_stock_threshold,
        }
    }

    /// Stats with "today" starting at local midnight.
    ///
    /// # Errors
    ///
    /// Returns the first remote store error.
    pub async fn stats(&self) -> Result<DashboardStats> {
        self.stats_since(start_of_today()).await
    }

    /// Stats with sales counted from `since`.
    ///
    /// # Errors
    ///
    /// Returns the first remote store error.
    #[instrument(skip(self))]
    pub async fn stats_since(&self, since: DateTime<Utc>) -> Result<DashboardStats> {
        let new_orders = self
            .remote
            .count(&Query::from(tables::ORDERS).eq("status", OrderStatus::New.as_str()))
            .await?;

        let totals: Vec<TotalRow> = select_as(
            self.remote.as_ref(),
            &Query::from(tables::ORDERS)
                .select("total")
                .gte("created_at", since.to_rfc3339()),
        )
        .await?;
        let sales_today: Decimal = totals.into_iter().map(|row| row.total).sum();

        let low_stock = self
            .products
            .low_stock_count(self.low_stock_threshold)
            .await?;
        let recent_orders = self.orders.recent(RECENT_ORDERS).await?;

        Ok(DashboardStats {
            new_orders,
            sales_today,
            sales_today_label: Price::kes(sales_today).to_string(),
            low_stock,
            recent_orders,
        })
    }
}

/// Local midnight today, in UTC.
fn start_of_today() -> DateTime<Utc> {
    let midnight = Local::now().date_naive().and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map_or_else(Utc::now, |dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use neemon_core::remote::MemoryRemote;
    use serde_json::json;

    fn order(id: &str, status: &str, total: &str, created_at: &str) -> serde_json::Value {
        json!({
            "id": id,
            "items": [{"productId": "p1", "qty": 1}],
            "total": total,
            "status": status,
            "payment": "mpesa",
            "mpesa_phone": "712345678",
            "method": "courier",
            "created_at": created_at,
        })
    }

    fn remote() -> MemoryRemote {
        MemoryRemote::new()
            .with_rows(
                tables::ORDERS,
                vec![
                    order("ORD-1", "NEW", "1000", "2025-03-09T23:00:00Z"),
                    order("ORD-2", "NEW", "2500.50", "2025-03-10T08:00:00Z"),
                    order("ORD-3", "DELIVERED", "1200", "2025-03-10T09:00:00Z"),
                    order("ORD-4", "PREPARING", "300", "2025-03-08T09:00:00Z"),
                    order("ORD-5", "CANCELLED", "700", "2025-03-07T09:00:00Z"),
                    order("ORD-6", "WITH_RIDER", "800", "2025-03-06T09:00:00Z"),
                ],
            )
            .with_rows(
                tables::PRODUCTS,
                vec![
                    json!({"id": "p1", "slug": "a", "name": "A", "brand": "N",
                           "category": "makeup", "price": 100, "stock": 3}),
                    json!({"id": "p2", "slug": "b", "name": "B", "brand": "N",
                           "category": "makeup", "price": 100, "stock": 10}),
                    json!({"id": "p3", "slug": "c", "name": "C", "brand": "N",
                           "category": "hair", "price": 100, "stock": 0, "is_active": false}),
                ],
            )
    }

    #[tokio::test]
    async fn test_stats_since() {
        let dashboard = DashboardService::new(Arc::new(remote()), 10);
        let since = DateTime::parse_from_rfc3339("2025-03-10T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let stats = dashboard.stats_since(since).await.unwrap();

        assert_eq!(stats.new_orders, 2);
        assert_eq!(stats.sales_today, Decimal::new(370_050, 2));
        assert_eq!(stats.sales_today_label, "KES 3,700.50");
        assert_eq!(stats.low_stock, 2);
        assert_eq!(stats.recent_orders.len(), RECENT_ORDERS);
        assert_eq!(stats.recent_orders[0].id.as_str(), "ORD-3");
    }

    #[tokio::test]
    async fn test_stats_on_empty_store() {
        let dashboard = DashboardService::new(Arc::new(MemoryRemote::new()), 10);
        let stats = dashboard.stats().await.unwrap();
        assert_eq!(stats.new_orders, 0);
        assert_eq!(stats.sales_today, Decimal::ZERO);
        assert!(stats.recent_orders.is_empty());
    }

    #[test]
    fn test_start_of_today_is_not_in_future() {
        assert!(start_of_today() <= Utc::now());
    }
}
