//! Per-profile preferences: last delivery location, theme and the
//! launch-notify list.

use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;

use neemon_core::{DeliveryLocation, Email, EmailError, Theme};

use crate::bus::{EventBus, StorefrontEvent};
use crate::store::{
    LocalStore, StoreError, StoredList, TabId, decode_json, keys, read_json, write_json,
};

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("coordinates out of range")]
    InvalidLocation,

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Preferences of one tab.
pub struct Preferences {
    store: Arc<dyn LocalStore>,
    tab: TabId,
    bus: EventBus,
    location: RwLock<Option<DeliveryLocation>>,
    theme: RwLock<Theme>,
}

impl Preferences {
    pub fn load(store: Arc<dyn LocalStore>, tab: TabId, bus: EventBus) -> Self {
        let location = read_json(store.as_ref(), keys::DELIVERY_LOCATION);
        let theme = read_json(store.as_ref(), keys::THEME).unwrap_or_default();
        Self {
            store,
            tab,
            bus,
            location: RwLock::new(location),
            theme: RwLock::new(theme),
        }
    }

    /// Most recent delivery location, if one was ever selected.
    #[must_use]
    pub fn delivery_location(&self) -> Option<DeliveryLocation> {
        self.location
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remember `location` and publish it.
    ///
    /// # Errors
    ///
    /// Returns [`PreferenceError::InvalidLocation`] for out-of-range
    /// coordinates.
    pub fn set_delivery_location(&self, location: DeliveryLocation) -> Result<(), PreferenceError> {
        if !location.is_valid() {
            return Err(PreferenceError::InvalidLocation);
        }
        write_json(self.store.as_ref(), keys::DELIVERY_LOCATION, &location, self.tab)?;
        *self.location.write().unwrap_or_else(PoisonError::into_inner) = Some(location.clone());
        self.bus.publish(StorefrontEvent::DeliveryLocationChanged(location));
        Ok(())
    }

    #[must_use]
    pub fn theme(&self) -> Theme {
        *self.theme.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Persist and publish a theme.
    ///
    /// # Errors
    ///
    /// Returns [`PreferenceError::Store`] if the write fails.
    pub fn set_theme(&self, theme: Theme) -> Result<(), PreferenceError> {
        write_json(self.store.as_ref(), keys::THEME, &theme, self.tab)?;
        *self.theme.write().unwrap_or_else(PoisonError::into_inner) = theme;
        self.bus.publish(StorefrontEvent::ThemeChanged(theme));
        Ok(())
    }

    /// Emails waiting for the launch announcement.
    #[must_use]
    pub fn notify_emails(&self) -> Vec<String> {
        StoredList::read(self.store.as_ref(), keys::NOTIFY_EMAILS).items
    }

    /// Add an email to the launch-notify list. Returns `false` if it was
    /// already listed (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`PreferenceError::InvalidEmail`] for malformed input.
    pub fn add_notify_email(&self, email: &str) -> Result<bool, PreferenceError> {
        let email = Email::parse(email)?;
        let mut emails = StoredList::<String>::read(self.store.as_ref(), keys::NOTIFY_EMAILS);
        if emails.items.iter().any(|e| email.matches(e)) {
            return Ok(false);
        }
        emails.items.push(email.into_inner());
        emails.write(self.store.as_ref(), keys::NOTIFY_EMAILS, self.tab)?;
        Ok(true)
    }

    /// Apply a delivery-location or theme write from another tab.
    pub fn apply_remote(&self, key: &str, raw: Option<&str>) {
        match key {
            keys::DELIVERY_LOCATION => {
                let location: Option<DeliveryLocation> =
                    raw.and_then(|raw| decode_json(key, raw));
                *self.location.write().unwrap_or_else(PoisonError::into_inner) = location.clone();
                if let Some(location) = location {
                    self.bus.publish(StorefrontEvent::DeliveryLocationChanged(location));
                }
            }
            keys::THEME => {
                let theme: Theme = raw.and_then(|raw| decode_json(key, raw)).unwrap_or_default();
                *self.theme.write().unwrap_or_else(PoisonError::into_inner) = theme;
                self.bus.publish(StorefrontEvent::ThemeChanged(theme));
            }
            _ => {}
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use neemon_core::DeliveryMethod;

    fn prefs() -> Preferences {
        Preferences::load(Arc::new(MemoryStore::new()), TabId::new(), EventBus::new())
    }

    #[test]
    fn test_theme_defaults_to_light_and_persists() {
        let store = Arc::new(MemoryStore::new());
        let prefs = Preferences::load(store.clone(), TabId::new(), EventBus::new());
        assert_eq!(prefs.theme(), Theme::Light);
        prefs.set_theme(Theme::Dark).unwrap();
        let reopened = Preferences::load(store, TabId::new(), EventBus::new());
        assert_eq!(reopened.theme(), Theme::Dark);
    }

    #[test]
    fn test_delivery_location_roundtrip_and_validation() {
        let prefs = prefs();
        assert!(prefs.delivery_location().is_none());

        let bad = DeliveryLocation {
            latitude: 120.0,
            ..DeliveryLocation::default_for(DeliveryMethod::Bodaboda)
        };
        assert!(matches!(
            prefs.set_delivery_location(bad),
            Err(PreferenceError::InvalidLocation)
        ));

        let here = DeliveryLocation::from_geolocation(-1.3, 36.8, DeliveryMethod::Courier);
        prefs.set_delivery_location(here.clone()).unwrap();
        assert_eq!(prefs.delivery_location(), Some(here));
    }

    #[test]
    fn test_notify_emails_dedup_case_insensitive() {
        let prefs = prefs();
        assert!(prefs.add_notify_email("Fan@Neemon.co.ke").unwrap());
        assert!(!prefs.add_notify_email("fan@neemon.co.ke").unwrap());
        assert!(prefs.add_notify_email("nope").is_err());
        assert_eq!(prefs.notify_emails(), vec!["Fan@Neemon.co.ke".to_owned()]);
    }

    #[test]
    fn test_apply_remote_theme() {
        let prefs = prefs();
        prefs.apply_remote(keys::THEME, Some("\"dark\""));
        assert_eq!(prefs.theme(), Theme::Dark);
        prefs.apply_remote(keys::THEME, None);
        assert_eq!(prefs.theme(), Theme::Light);
    }
}
