//! Delivery location picked on the map or from device geolocation.

use serde::{Deserialize, Serialize};

use super::status::DeliveryMethod;

/// A delivery pin.
///
/// Persisted as the most recent selection and copied into the order row at
/// checkout. Coordinates are WGS84 degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_label: Option<String>,
    pub delivery_method: DeliveryMethod,
}

impl DeliveryLocation {
    /// Map centre used before anything is selected (Nairobi CBD).
    pub const DEFAULT_CENTER: (f64, f64) = (-1.286_389, 36.817_223);

    /// Label applied to locations taken from device geolocation.
    pub const CURRENT_LOCATION_LABEL: &'static str = "My current location";

    /// The default pin for a delivery method.
    #[must_use]
    pub const fn default_for(delivery_method: DeliveryMethod) -> Self {
        Self {
            latitude: Self::DEFAULT_CENTER.0,
            longitude: Self::DEFAULT_CENTER.1,
            address_label: None,
            delivery_method,
        }
    }

    /// A pin taken from device geolocation.
    #[must_use]
    pub fn from_geolocation(latitude: f64, longitude: f64, delivery_method: DeliveryMethod) -> Self {
        Self {
            latitude,
            longitude,
            address_label: Some(Self::CURRENT_LOCATION_LABEL.to_owned()),
            delivery_method,
        }
    }

    /// Whether the coordinates are finite and within WGS84 bounds.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Same pin, re-tagged with another delivery method.
    #[must_use]
    pub fn with_method(mut self, delivery_method: DeliveryMethod) -> Self {
        self.delivery_method = delivery_method;
        self
    }
}
