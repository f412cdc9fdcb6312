//! In-process event bus.
//!
//! Same-tab fan-out of state changes to other views of one
//! [`crate::Storefront`] context. Storage notifications between tabs travel
//! through [`crate::store::LocalStore::subscribe`] instead; the two are never
//! mixed.

use neemon_core::{CartLine, DeliveryLocation, OrderId, ProductId, PublicUser, Theme};
use tokio::sync::broadcast;

const BUS_CAPACITY: usize = 128;

/// Progress of an order submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutPhase {
    /// Payment prompt is being sent to the customer's phone.
    PushSending,
    /// Prompt delivered; waiting for the customer to confirm.
    PushSent,
    /// Order row is being written.
    Submitting,
    /// Order stored and cart cleared.
    Placed(OrderId),
    /// Submission failed with a user-facing message.
    Failed(String),
}

/// A state change inside one tab.
#[derive(Debug, Clone, PartialEq)]
pub enum StorefrontEvent {
    CartChanged(Vec<CartLine>),
    WishlistChanged(Vec<ProductId>),
    /// `None` after logout.
    AuthChanged(Option<PublicUser>),
    DeliveryLocationChanged(DeliveryLocation),
    ThemeChanged(Theme),
    Checkout(CheckoutPhase),
}

/// Publish/subscribe hub for [`StorefrontEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<StorefrontEvent>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    /// Deliver `event` to every current subscriber.
    pub fn publish(&self, event: StorefrontEvent) {
        // Nobody listening is not an error.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StorefrontEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_reaches_all_subscribers() {
        let bus = EventBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        bus.publish(StorefrontEvent::ThemeChanged(Theme::Dark));
        assert_eq!(a.try_recv().unwrap(), StorefrontEvent::ThemeChanged(Theme::Dark));
        assert_eq!(b.try_recv().unwrap(), StorefrontEvent::ThemeChanged(Theme::Dark));
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        EventBus::new().publish(StorefrontEvent::AuthChanged(None));
    }
}
