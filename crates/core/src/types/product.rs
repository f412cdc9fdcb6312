//! Catalog product rows.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;
use super::status::ParseEnumError;

/// Product category slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Makeup,
    Skincare,
    Hair,
    Perfumes,
    Tools,
}

impl Category {
    /// All categories in menu order.
    pub const ALL: [Self; 5] = [
        Self::Makeup,
        Self::Skincare,
        Self::Hair,
        Self::Perfumes,
        Self::Tools,
    ];

    /// URL slug / column value.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Makeup => "makeup",
            Self::Skincare => "skincare",
            Self::Hair => "hair",
            Self::Perfumes => "perfumes",
            Self::Tools => "tools",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Category {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.slug() == wanted)
            .ok_or_else(|| ParseEnumError::new("category", s))
    }
}

/// A row of the remote `products` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    pub brand: String,
    pub category: Category,
    /// Unit price in KES.
    pub price: Decimal,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub reviews_count: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

const fn default_true() -> bool {
    true
}

impl Product {
    /// Unit price.
    #[must_use]
    pub const fn unit_price(&self) -> Price {
        Price::kes(self.price)
    }

    /// Whether the product is listed and has stock.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.is_active && self.stock > 0
    }

    /// Whether stock is strictly below `threshold`.
    #[must_use]
    pub const fn is_low_stock(&self, threshold: i32) -> bool {
        self.stock < threshold
    }
}

/// Fields a seller supplies when creating or editing a product.
///
/// Serialized as the insert/update body; server-managed columns (`id` on
/// update, `created_at`, ratings) are left out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub slug: String,
    pub name: String,
    pub brand: String,
    pub category: Category,
    pub price: Decimal,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub stock: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}
