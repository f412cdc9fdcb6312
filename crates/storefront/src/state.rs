//! The storefront context shared across handlers.
//!
//! A [`Storefront`] is one tab: its own in-memory cart, wishlist, identity
//! and preferences over a local store that other tabs of the same profile
//! may share. Writes from other tabs arrive as storage events and are
//! applied verbatim by the sync task started with [`Storefront::start_sync`].

use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use neemon_core::remote::RemoteStore;
use neemon_core::Order;

use crate::bus::EventBus;
use crate::config::{AuthBackend, LaunchConfig, StorefrontConfig};
use crate::services::addresses::AddressBook;
use crate::services::auth::{
    Account, AuthState, Identity, IdentityProvider, LocalIdentity, RemoteIdentity,
};
use crate::services::cart::Cart;
use crate::services::catalog::Catalog;
use crate::services::checkout::{Checkout, CheckoutError, CheckoutRequest, PaymentDelays};
use crate::services::preferences::Preferences;
use crate::services::reviews::Reviews;
use crate::services::wishlist::Wishlist;
use crate::store::{LocalStore, StorageEvent, TabId, keys};

/// Which identity backing a tab uses.
#[derive(Clone)]
pub enum IdentityBacking {
    Local,
    Remote(Arc<dyn IdentityProvider>),
}

impl IdentityBacking {
    const fn kind(&self) -> AuthBackend {
        match self {
            Self::Local => AuthBackend::Local,
            Self::Remote(_) => AuthBackend::Remote,
        }
    }
}

/// Tunables taken from configuration.
#[derive(Debug, Clone)]
pub struct StorefrontOptions {
    pub payment_delays: PaymentDelays,
    pub catalog_ttl: Duration,
    pub launch: LaunchConfig,
}

impl Default for StorefrontOptions {
    fn default() -> Self {
        Self {
            payment_delays: PaymentDelays::default(),
            catalog_ttl: Duration::from_secs(300),
            launch: LaunchConfig::default(),
        }
    }
}

impl From<&StorefrontConfig> for StorefrontOptions {
    fn from(config: &StorefrontConfig) -> Self {
        Self {
            payment_delays: config.payment_delays,
            catalog_ttl: config.catalog_ttl,
            launch: config.launch.clone(),
        }
    }
}

/// One tab's state.
///
/// This struct is cheaply cloneable via `Arc`. Dropping the last clone stops
/// the sync task.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    tab: TabId,
    store: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteStore>,
    backing: IdentityBacking,
    options: StorefrontOptions,
    bus: EventBus,
    catalog: Catalog,
    cart: Cart,
    wishlist: Wishlist,
    account: Account,
    addresses: AddressBook,
    reviews: Reviews,
    preferences: Preferences,
    sync: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for StorefrontInner {
    fn drop(&mut self) {
        if let Some(handle) = self
            .sync
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}

impl Storefront {
    /// Open a tab over `store`, loading its persisted state.
    pub fn new(
        store: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteStore>,
        backing: IdentityBacking,
        options: StorefrontOptions,
    ) -> Self {
        let catalog = Catalog::new(remote.clone(), options.catalog_ttl);
        Self::build(store, remote, backing, options, catalog)
    }

    fn build(
        store: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteStore>,
        backing: IdentityBacking,
        options: StorefrontOptions,
        catalog: Catalog,
    ) -> Self {
        let tab = TabId::new();
        let bus = EventBus::new();
        let identity = match &backing {
            IdentityBacking::Local => Identity::Local(LocalIdentity::new(store.clone(), tab)),
            IdentityBacking::Remote(provider) => {
                Identity::Remote(RemoteIdentity::new(provider.clone(), store.clone(), tab))
            }
        };

        let inner = StorefrontInner {
            cart: Cart::load(store.clone(), tab, bus.clone()),
            wishlist: Wishlist::load(store.clone(), tab, bus.clone()),
            account: Account::load(identity, store.clone(), tab, bus.clone()),
            addresses: AddressBook::new(store.clone(), tab),
            reviews: Reviews::new(store.clone(), tab),
            preferences: Preferences::load(store.clone(), tab, bus.clone()),
            tab,
            store,
            remote,
            backing,
            options,
            bus,
            catalog,
            sync: Mutex::new(None),
        };
        debug!(tab = %tab, backend = ?inner.backing.kind(), "tab opened");
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Open another tab of the same profile. The catalog cache is shared.
    #[must_use]
    pub fn open_tab(&self) -> Self {
        Self::build(
            self.inner.store.clone(),
            self.inner.remote.clone(),
            self.inner.backing.clone(),
            self.inner.options.clone(),
            self.inner.catalog.clone(),
        )
    }

    #[must_use]
    pub fn tab(&self) -> TabId {
        self.inner.tab
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn LocalStore> {
        &self.inner.store
    }

    #[must_use]
    pub fn remote(&self) -> &Arc<dyn RemoteStore> {
        &self.inner.remote
    }

    /// Same-tab event bus.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.inner.bus
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn cart(&self) -> &Cart {
        &self.inner.cart
    }

    #[must_use]
    pub fn wishlist(&self) -> &Wishlist {
        &self.inner.wishlist
    }

    #[must_use]
    pub fn account(&self) -> &Account {
        &self.inner.account
    }

    #[must_use]
    pub fn addresses(&self) -> &AddressBook {
        &self.inner.addresses
    }

    #[must_use]
    pub fn reviews(&self) -> &Reviews {
        &self.inner.reviews
    }

    #[must_use]
    pub fn preferences(&self) -> &Preferences {
        &self.inner.preferences
    }

    #[must_use]
    pub fn launch(&self) -> &LaunchConfig {
        &self.inner.options.launch
    }

    /// Checkout over this tab's cart.
    #[must_use]
    pub fn checkout(&self) -> Checkout<'_> {
        Checkout::new(
            &self.inner.cart,
            &self.inner.catalog,
            self.inner.remote.as_ref(),
            &self.inner.bus,
            self.inner.options.payment_delays,
        )
    }

    /// Place an order as the signed-in user, or as a guest. Without a map
    /// pin in the request, the saved delivery location is used.
    ///
    /// # Errors
    ///
    /// See [`Checkout::place_order`].
    pub async fn place_order(
        &self,
        mut request: CheckoutRequest,
    ) -> Result<Order, CheckoutError> {
        if request.location.is_none() {
            request.location = self.inner.preferences.delivery_location();
        }
        let user = self.inner.account.user();
        self.checkout().place_order(request, user.as_ref()).await
    }

    /// Re-validate the persisted session.
    pub async fn restore(&self) -> AuthState {
        self.inner.account.restore().await
    }

    /// Apply a storage event. Events written by this tab are ignored.
    pub fn apply_storage_event(&self, event: &StorageEvent) {
        if event.origin == self.inner.tab {
            return;
        }
        debug!(key = %event.key, origin = %event.origin, "applying write from another tab");
        self.apply_key(&event.key, event.value.as_deref());
    }

    fn apply_key(&self, key: &str, raw: Option<&str>) {
        match key {
            keys::CART => self.inner.cart.apply_remote(raw),
            keys::WISHLIST => self.inner.wishlist.apply_remote(raw),
            keys::CURRENT_USER => self.inner.account.apply_remote(raw),
            keys::DELIVERY_LOCATION | keys::THEME => self.inner.preferences.apply_remote(key, raw),
            // Read through the store on every access.
            _ => {}
        }
    }

    /// Re-read every key, after notifications were missed.
    pub fn reload_all(&self) {
        for key in keys::ALL {
            let raw = self.inner.store.get(key);
            self.apply_key(key, raw.as_deref());
        }
    }

    /// Start applying other tabs' writes. Calling it again is a no-op.
    pub fn start_sync(&self) {
        let mut slot = self.inner.sync.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }
        let mut events = self.inner.store.subscribe();
        let weak: Weak<StorefrontInner> = Arc::downgrade(&self.inner);
        let tab = self.inner.tab;

        *slot = Some(tokio::spawn(async move {
            loop {
                let received = events.recv().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let storefront = Storefront { inner };
                match received {
                    Ok(event) => storefront.apply_storage_event(&event),
                    Err(RecvError::Lagged(missed)) => {
                        warn!(tab = %tab, missed, "storage notifications lagged, reloading");
                        storefront.reload_all();
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!(tab = %tab, "storage sync stopped");
        }));
        info!(tab = %tab, "storage sync started");
    }

    /// Stop the sync task.
    pub fn shutdown(&self) {
        if let Some(handle) = self
            .inner
            .sync
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
            info!(tab = %self.inner.tab, "storage sync stopped");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::bus::StorefrontEvent;
    use crate::store::MemoryStore;
    use neemon_core::remote::{MemoryRemote, tables};
    use neemon_core::{DeliveryLocation, DeliveryMethod, PaymentMode, ProductId, Theme};
    use serde_json::json;

    fn storefront() -> Storefront {
        Storefront::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryRemote::new()),
            IdentityBacking::Local,
            StorefrontOptions::default(),
        )
    }

    fn pid(s: &str) -> ProductId {
        ProductId::parse(s).unwrap()
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_other_tab_writes_replace_local_state() {
        let first = storefront();
        let second = first.open_tab();
        first.start_sync();
        second.start_sync();

        second.cart().add_item(&pid("p1"), 3.0).unwrap();
        second.preferences().set_theme(Theme::Dark).unwrap();
        settle().await;

        assert_eq!(first.cart().qty_of(&pid("p1")), Some(3));
        assert_eq!(first.preferences().theme(), Theme::Dark);
    }

    #[tokio::test]
    async fn test_own_writes_are_not_echoed() {
        let tab = storefront();
        tab.start_sync();
        let mut events = tab.bus().subscribe();

        tab.cart().add_item(&pid("p1"), 1.0).unwrap();
        settle().await;

        let mut cart_events = 0;
        while let Ok(event) = events.try_recv() {
            if matches!(event, StorefrontEvent::CartChanged(_)) {
                cart_events += 1;
            }
        }
        assert_eq!(cart_events, 1);
    }

    #[tokio::test]
    async fn test_apply_storage_event_ignores_own_tab() {
        let tab = storefront();
        tab.cart().add_item(&pid("p1"), 2.0).unwrap();
        tab.apply_storage_event(&StorageEvent {
            key: keys::CART.to_owned(),
            value: None,
            origin: tab.tab(),
        });
        assert_eq!(tab.cart().count(), 2);

        tab.apply_storage_event(&StorageEvent {
            key: keys::CART.to_owned(),
            value: None,
            origin: TabId::new(),
        });
        assert!(tab.cart().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_stops_sync() {
        let first = storefront();
        let second = first.open_tab();
        first.start_sync();
        first.shutdown();
        settle().await;

        second.cart().add_item(&pid("p1"), 1.0).unwrap();
        settle().await;
        assert!(first.cart().is_empty());
    }

    fn delivery_request() -> CheckoutRequest {
        CheckoutRequest {
            method: DeliveryMethod::Bodaboda,
            address_text: None,
            location: None,
            payment: PaymentMode::Delivery,
            mpesa_phone: None,
        }
    }

    #[tokio::test]
    async fn test_place_order_falls_back_to_saved_location() {
        let remote = MemoryRemote::new().with_rows(
            tables::PRODUCTS,
            vec![json!({"id": "p1", "slug": "velvet-lipstick", "name": "Velvet Lipstick",
                        "brand": "Neemon", "category": "makeup", "price": 1450, "stock": 4})],
        );
        let tab = Storefront::new(
            Arc::new(MemoryStore::new()),
            Arc::new(remote),
            IdentityBacking::Local,
            StorefrontOptions::default(),
        );
        tab.cart().add_item(&pid("p1"), 1.0).unwrap();

        assert!(matches!(
            tab.place_order(delivery_request()).await,
            Err(CheckoutError::MissingDeliveryInfo)
        ));

        let saved = DeliveryLocation::default_for(DeliveryMethod::Bodaboda);
        tab.preferences().set_delivery_location(saved.clone()).unwrap();
        let order = tab.place_order(delivery_request()).await.unwrap();
        let pinned = order.delivery_location.unwrap();
        assert!((pinned.latitude - saved.latitude).abs() < f64::EPSILON);
        assert!(tab.cart().is_empty());
    }

    #[tokio::test]
    async fn test_reload_all_picks_up_missed_writes() {
        let first = storefront();
        let second = first.open_tab();
        second.wishlist().toggle(&pid("p9")).unwrap();
        assert!(!first.wishlist().contains(&pid("p9")));
        first.reload_all();
        assert!(first.wishlist().contains(&pid("p9")));
    }
}
