//! Order placement.
//!
//! Turns the cart, delivery details, payment selection and (optional)
//! identity into one row of the remote `orders` table. The cart is cleared
//! only after the insert succeeds. There is no payment gateway: the M-Pesa
//! path waits through a simulated push-and-confirm delay instead.

use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use neemon_core::remote::{RemoteError, RemoteStore, insert_one, tables};
use neemon_core::{
    CartLine, DeliveryLocation, DeliveryMethod, Order, OrderId, OrderStatus, PaymentMode,
    PublicUser,
};

use super::cart::Cart;
use super::catalog::Catalog;
use crate::bus::{CheckoutPhase, EventBus, StorefrontEvent};
use crate::store::StoreError;

/// Digits an M-Pesa number must have once the country code and separators
/// are stripped.
pub const MPESA_PHONE_DIGITS: usize = 9;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Add a text address or select a map location.")]
    MissingDeliveryInfo,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Remote(#[from] RemoteError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Simulated payment timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentDelays {
    /// Between "sending push" and "push sent".
    pub submit: Duration,
    /// Between "push sent" and order submission.
    pub confirm: Duration,
}

impl Default for PaymentDelays {
    fn default() -> Self {
        Self {
            submit: Duration::from_millis(1500),
            confirm: Duration::from_millis(3000),
        }
    }
}

/// What the shopper filled in on the checkout page.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub method: DeliveryMethod,
    #[serde(default)]
    pub address_text: Option<String>,
    #[serde(default)]
    pub location: Option<DeliveryLocation>,
    pub payment: PaymentMode,
    #[serde(default)]
    pub mpesa_phone: Option<String>,
}

impl CheckoutRequest {
    fn trimmed_address(&self) -> Option<String> {
        self.address_text
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    }
}

/// Strip everything but digits and require exactly nine of them.
///
/// # Errors
///
/// Returns [`CheckoutError::Validation`] for anything else.
pub fn normalize_mpesa_phone(raw: &str) -> Result<String, CheckoutError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == MPESA_PHONE_DIGITS {
        Ok(digits)
    } else {
        Err(CheckoutError::Validation(
            "Please enter a valid M-Pesa phone number (e.g. 712345678)".to_owned(),
        ))
    }
}

/// One checkout attempt over a tab's cart.
pub struct Checkout<'a> {
    cart: &'a Cart,
    catalog: &'a Catalog,
    remote: &'a dyn RemoteStore,
    bus: &'a EventBus,
    delays: PaymentDelays,
}

impl<'a> Checkout<'a> {
    #[must_use]
    pub const fn new(
        cart: &'a Cart,
        catalog: &'a Catalog,
        remote: &'a dyn RemoteStore,
        bus: &'a EventBus,
        delays: PaymentDelays,
    ) -> Self {
        Self {
            cart,
            catalog,
            remote,
            bus,
            delays,
        }
    }

    /// Place the order.
    ///
    /// Validation happens before any network call. Lines whose product the
    /// catalog does not know are dropped and do not count toward the total.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::MissingDeliveryInfo`] without address text or a map location
    /// - [`CheckoutError::Validation`] for an empty cart or a bad M-Pesa number
    /// - [`CheckoutError::Remote`] if pricing the cart or the insert fails; the
    ///   cart is left untouched
    /// - [`CheckoutError::Store`] if clearing the cart fails after the insert
    #[instrument(skip(self, request, user), fields(payment = %request.payment, method = %request.method))]
    pub async fn place_order(
        &self,
        request: CheckoutRequest,
        user: Option<&PublicUser>,
    ) -> Result<Order, CheckoutError> {
        let address_text = request.trimmed_address();
        if address_text.is_none() && request.location.is_none() {
            return Err(CheckoutError::MissingDeliveryInfo);
        }

        let (items, total) = self.price_cart().await?;
        if items.is_empty() {
            return Err(CheckoutError::Validation("Your cart is empty.".to_owned()));
        }

        let mpesa_phone = if request.payment.is_immediate() {
            let phone = normalize_mpesa_phone(request.mpesa_phone.as_deref().unwrap_or(""))?;
            self.simulate_push().await;
            Some(phone)
        } else {
            None
        };

        let order = Order {
            id: OrderId::new_order(),
            items,
            total,
            status: OrderStatus::New,
            payment: request.payment,
            mpesa_phone,
            method: request.method,
            address_text,
            delivery_location: request.location.map(|l| l.with_method(request.method)),
            user_id: user.map(|u| u.id.clone()),
            customer_name: user.map(|u| u.name.clone()),
            customer_email: user.map(|u| u.email.to_string()),
            customer_phone: user.map(|u| u.phone.clone()).filter(|p| !p.is_empty()),
            created_at: Utc::now(),
        };

        self.bus
            .publish(StorefrontEvent::Checkout(CheckoutPhase::Submitting));
        if let Err(e) = insert_one(self.remote, tables::ORDERS, &order).await {
            warn!(error = %e, "order insert failed");
            self.bus
                .publish(StorefrontEvent::Checkout(CheckoutPhase::Failed(e.to_string())));
            return Err(e.into());
        }

        self.cart.clear()?;
        info!(order_id = %order.id, total = %order.total, "order placed");
        self.bus
            .publish(StorefrontEvent::Checkout(CheckoutPhase::Placed(order.id.clone())));
        Ok(order)
    }

    async fn price_cart(&self) -> Result<(Vec<CartLine>, Decimal), RemoteError> {
        let mut items = Vec::new();
        let mut total = Decimal::ZERO;
        for line in self.cart.lines() {
            match self.catalog.try_product(&line.product_id).await? {
                Some(product) => {
                    total += product.unit_price().times(line.qty).amount;
                    items.push(line);
                }
                None => warn!(product_id = %line.product_id, "dropping unknown product from order"),
            }
        }
        Ok((items, total))
    }

    async fn simulate_push(&self) {
        self.bus
            .publish(StorefrontEvent::Checkout(CheckoutPhase::PushSending));
        tokio::time::sleep(self.delays.submit).await;
        self.bus
            .publish(StorefrontEvent::Checkout(CheckoutPhase::PushSent));
        tokio::time::sleep(self.delays.confirm).await;
    }
}
