//! Status and selection enums shared between the storefront and admin.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a string does not name a known variant.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Order fulfillment status, as set by the seller.
///
/// The nominal flow is `NEW → PREPARING → WITH_RIDER → DELIVERED`, with
/// `CANCELLED` reachable from any non-terminal state. Nothing enforces that
/// flow: the admin surface may set any status from any status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    New,
    Preparing,
    WithRider,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// All statuses in display order.
    pub const ALL: [Self; 5] = [
        Self::New,
        Self::Preparing,
        Self::WithRider,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Wire value (`NEW`, `WITH_RIDER`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Preparing => "PREPARING",
            Self::WithRider => "WITH_RIDER",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Human label (`WITH RIDER`).
    #[must_use]
    pub fn label(self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace(' ', "_").to_uppercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| ParseEnumError::new("order status", s))
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    /// Immediate mobile-money payment (M-Pesa STK push), confirmed before the
    /// order is submitted.
    #[default]
    Mpesa,
    /// Pay via M-Pesa or cash upon receipt.
    Delivery,
}

impl PaymentMode {
    /// Whether the payment is confirmed before the order is submitted.
    #[must_use]
    pub const fn is_immediate(self) -> bool {
        matches!(self, Self::Mpesa)
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mpesa => f.write_str("mpesa"),
            Self::Delivery => f.write_str("delivery"),
        }
    }
}

impl FromStr for PaymentMode {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mpesa" | "m-pesa" => Ok(Self::Mpesa),
            "delivery" | "cod" => Ok(Self::Delivery),
            _ => Err(ParseEnumError::new("payment mode", s)),
        }
    }
}

/// How the order reaches the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    /// Same-day motorbike delivery within Nairobi.
    #[default]
    Bodaboda,
    /// 1-3 day courier anywhere in Kenya.
    Courier,
}

impl DeliveryMethod {
    /// Delivery estimate shown on the cart page.
    #[must_use]
    pub const fn estimate(self) -> &'static str {
        match self {
            Self::Bodaboda => "Same-day via bodaboda",
            Self::Courier => "1-3 days via courier",
        }
    }
}

impl fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bodaboda => f.write_str("bodaboda"),
            Self::Courier => f.write_str("courier"),
        }
    }
}

impl FromStr for DeliveryMethod {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bodaboda" => Ok(Self::Bodaboda),
            "courier" => Ok(Self::Courier),
            _ => Err(ParseEnumError::new("delivery method", s)),
        }
    }
}

/// Colour theme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// The other theme.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl FromStr for Theme {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(ParseEnumError::new("theme", s)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::WithRider).unwrap(),
            "\"WITH_RIDER\""
        );
        let parsed: OrderStatus = serde_json::from_str("\"CANCELLED\"").unwrap();
        assert_eq!(parsed, OrderStatus::Cancelled);
    }

    #[test]
    fn test_order_status_from_str_accepts_labels() {
        assert_eq!("with rider".parse::<OrderStatus>().unwrap(), OrderStatus::WithRider);
        assert_eq!("NEW".parse::<OrderStatus>().unwrap(), OrderStatus::New);
        assert!("SHIPPED".parse::<OrderStatus>().is_err());
        assert_eq!(OrderStatus::WithRider.label(), "WITH RIDER");
    }

    #[test]
    fn test_selection_enums() {
        assert!(PaymentMode::Mpesa.is_immediate());
        assert!(!PaymentMode::Delivery.is_immediate());
        assert_eq!("Courier".parse::<DeliveryMethod>().unwrap(), DeliveryMethod::Courier);
        assert_eq!(serde_json::to_string(&DeliveryMethod::Bodaboda).unwrap(), "\"bodaboda\"");
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
    }
}
