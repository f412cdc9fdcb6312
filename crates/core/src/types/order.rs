//! Order rows.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cart::{CartLine, total_units};
use super::id::{OrderId, UserId};
use super::location::DeliveryLocation;
use super::price::Price;
use super::status::{DeliveryMethod, OrderStatus, PaymentMode};

/// A row of the remote `orders` table.
///
/// Written once at checkout. Afterwards only `status` changes, and only from
/// the admin surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub items: Vec<CartLine>,
    /// Order total in KES.
    pub total: Decimal,
    #[serde(default)]
    pub status: OrderStatus,
    pub payment: PaymentMode,
    /// Phone that received the payment prompt (immediate payment only).
    #[serde(default)]
    pub mpesa_phone: Option<String>,
    pub method: DeliveryMethod,
    #[serde(default)]
    pub address_text: Option<String>,
    #[serde(default)]
    pub delivery_location: Option<DeliveryLocation>,
    /// `None` for guest checkout.
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Total as a price.
    #[must_use]
    pub const fn total_price(&self) -> Price {
        Price::kes(self.total)
    }

    /// Number of units across all lines.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        total_units(&self.items)
    }

    /// Phone to notify about status changes: the customer's contact phone,
    /// falling back to the payment phone.
    #[must_use]
    pub fn contact_phone(&self) -> Option<&str> {
        self.customer_phone
            .as_deref()
            .or(self.mpesa_phone.as_deref())
            .filter(|p| !p.is_empty())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_row_with_missing_optionals() {
        let row = serde_json::json!({
            "id": "ORD-1234abcd",
            "items": [{"productId": "p1", "qty": 2}, {"productId": "p2", "qty": 1}],
            "total": "4350.00",
            "status": "WITH_RIDER",
            "payment": "delivery",
            "method": "courier",
            "address_text": "Kilimani, Nairobi",
            "created_at": "2025-02-01T10:00:00Z"
        });
        let order: Order = serde_json::from_value(row).unwrap();
        assert_eq!(order.status, OrderStatus::WithRider);
        assert_eq!(order.unit_count(), 3);
        assert!(order.user_id.is_none());
        assert!(order.contact_phone().is_none());
        assert_eq!(order.total_price().to_string(), "KES 4,350");
    }
}
