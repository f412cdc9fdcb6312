//! Application state shared across handlers.

use std::sync::Arc;

use neemon_core::remote::RemoteStore;

use crate::config::DEFAULT_LOW_STOCK_THRESHOLD;
use crate::services::{DashboardService, OrderService, ProductService};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    remote: Arc<dyn RemoteStore>,
    orders: OrderService,
    products: ProductService,
    dashboard: DashboardService,
    low_stock_threshold: i32,
}

impl AppState {
    /// Build state over a remote store holding service-role access.
    pub fn new(remote: Arc<dyn RemoteStore>, low_stock_threshold: i32) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                orders: OrderService::new(remote.clone()),
                products: ProductService::new(remote.clone()),
                dashboard: DashboardService::new(remote.clone(), low_stock_threshold),
                remote,
                low_stock_threshold,
            }),
        }
    }

    /// State with the default low-stock threshold.
    pub fn with_defaults(remote: Arc<dyn RemoteStore>) -> Self {
        Self::new(remote, DEFAULT_LOW_STOCK_THRESHOLD)
    }

    #[must_use]
    pub fn remote(&self) -> &Arc<dyn RemoteStore> {
        &self.inner.remote
    }

    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }

    #[must_use]
    pub fn products(&self) -> &ProductService {
        &self.inner.products
    }

    /// Products with stock strictly below this are flagged as low.
    #[must_use]
    pub fn low_stock_threshold(&self) -> i32 {
        self.inner.low_stock_threshold
    }

    #[must_use]
    pub fn dashboard(&self) -> &DashboardService {
        &self.inner.dashboard
    }
}
