//! Business logic services for admin.
//!
//! # Services
//!
//! - `orders` - Order listing, filtering and status changes
//! - `products` - Catalog maintenance and stock checks
//! - `dashboard` - Overview counters and recent orders

pub mod dashboard;
pub mod orders;
pub mod products;

pub use dashboard::{DashboardService, DashboardStats};
pub use orders::{OrderService, StatusChange};
pub use products::ProductService;
