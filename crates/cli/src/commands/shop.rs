//! Catalog, cart, wishlist and checkout commands.
//!
//! # Usage
//!
//! ```bash
//! neemon products --category makeup
//! neemon cart add p1 --qty 2
//! neemon cart set p1 0
//! neemon wishlist toggle p2
//! neemon checkout --method bodaboda --address "Kilimani, Nairobi" --payment mpesa --phone 712345678
//! ```

use neemon_core::{Category, DeliveryLocation, DeliveryMethod, PaymentMode, Product, ProductId};
use neemon_storefront::Storefront;
use neemon_storefront::error::{AppError, Result};
use neemon_storefront::routes::cart::CartView;
use neemon_storefront::routes::checkout::PlacedOrder;
use neemon_storefront::services::checkout::CheckoutRequest;
use serde::Serialize;

fn product_id(raw: &str) -> Result<ProductId> {
    ProductId::parse(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Listed products, optionally for one category.
pub async fn products(storefront: &Storefront, category: Option<Category>) -> Vec<Product> {
    match category {
        Some(category) => storefront.catalog().products_by_category(category).await,
        None => storefront.catalog().products().await,
    }
}

/// Current cart joined with the catalog.
pub async fn cart_show(storefront: &Storefront) -> CartView {
    CartView::build(storefront, storefront.cart().lines()).await
}

/// Add `qty` units (non-positive quantities add one).
///
/// # Errors
///
/// Returns an error for an empty product id or a failed local write.
pub async fn cart_add(storefront: &Storefront, id: &str, qty: f64) -> Result<CartView> {
    storefront.cart().add_item(&product_id(id)?, qty)?;
    Ok(cart_show(storefront).await)
}

/// Set a line's quantity; zero or less removes it.
///
/// # Errors
///
/// Returns an error for an empty product id or a failed local write.
pub async fn cart_set(storefront: &Storefront, id: &str, qty: f64) -> Result<CartView> {
    storefront.cart().set_qty(&product_id(id)?, qty)?;
    Ok(cart_show(storefront).await)
}

/// Remove a line.
///
/// # Errors
///
/// Returns an error for an empty product id or a failed local write.
pub async fn cart_remove(storefront: &Storefront, id: &str) -> Result<CartView> {
    storefront.cart().remove_item(&product_id(id)?)?;
    Ok(cart_show(storefront).await)
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error if the local write fails.
pub async fn cart_clear(storefront: &Storefront) -> Result<CartView> {
    storefront.cart().clear()?;
    Ok(cart_show(storefront).await)
}

/// Move a cart line to the wishlist.
///
/// # Errors
///
/// Returns an error for an empty product id or a failed local write.
pub async fn save_for_later(storefront: &Storefront, id: &str) -> Result<CartView> {
    storefront
        .wishlist()
        .save_for_later(storefront.cart(), &product_id(id)?)?;
    Ok(cart_show(storefront).await)
}

#[derive(Debug, Serialize)]
pub struct WishlistToggled {
    pub product_id: ProductId,
    pub in_wishlist: bool,
}

/// Wishlisted product ids.
pub fn wishlist_show(storefront: &Storefront) -> Vec<ProductId> {
    storefront.wishlist().ids()
}

/// Flip wishlist membership.
///
/// # Errors
///
/// Returns an error for an empty product id or a failed local write.
pub fn wishlist_toggle(storefront: &Storefront, id: &str) -> Result<WishlistToggled> {
    let product_id = product_id(id)?;
    let in_wishlist = storefront.wishlist().toggle(&product_id)?;
    Ok(WishlistToggled {
        product_id,
        in_wishlist,
    })
}

/// Move a wishlisted product into the cart.
///
/// # Errors
///
/// Returns an error for an empty product id or a failed local write.
pub async fn wishlist_move_to_cart(storefront: &Storefront, id: &str) -> Result<CartView> {
    storefront
        .wishlist()
        .move_to_cart(storefront.cart(), &product_id(id)?)?;
    Ok(cart_show(storefront).await)
}

/// Checkout arguments as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct CheckoutArgs {
    pub method: DeliveryMethod,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub payment: PaymentMode,
    pub phone: Option<String>,
}

impl CheckoutArgs {
    /// Map pin from explicit coordinates. Without one, the storefront falls
    /// back to the saved delivery location.
    fn location(&self) -> Option<DeliveryLocation> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(DeliveryLocation::from_geolocation(lat, lng, self.method)),
            _ => None,
        }
    }
}

/// Place an order for the current cart.
///
/// # Errors
///
/// Returns validation errors before any network call, or the remote store's
/// message if the insert fails. The cart is kept on failure.
pub async fn checkout(storefront: &Storefront, args: CheckoutArgs) -> Result<PlacedOrder> {
    let request = CheckoutRequest {
        method: args.method,
        address_text: args.address.clone(),
        location: args.location(),
        payment: args.payment,
        mpesa_phone: args.phone.clone(),
    };
    let order = storefront.place_order(request).await?;
    Ok(PlacedOrder {
        total_label: order.total_price().to_string(),
        reference: order.id.short().to_owned(),
        order,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use neemon_core::remote::{MemoryRemote, tables};
    use neemon_storefront::store::MemoryStore;
    use neemon_storefront::{IdentityBacking, StorefrontOptions};
    use serde_json::json;

    use super::*;

    fn storefront(remote: Arc<MemoryRemote>) -> Storefront {
        Storefront::new(
            Arc::new(MemoryStore::new()),
            remote,
            IdentityBacking::Local,
            StorefrontOptions::default(),
        )
    }

    fn remote() -> Arc<MemoryRemote> {
        Arc::new(MemoryRemote::new().with_rows(
            tables::PRODUCTS,
            vec![
                json!({"id": "p1", "slug": "velvet-lipstick", "name": "Velvet Lipstick",
                       "brand": "Neemon", "category": "makeup", "price": 1450, "stock": 4, "is_active": true}),
                json!({"id": "p2", "slug": "argan-oil", "name": "Argan Oil",
                       "brand": "Neemon", "category": "hair", "price": 2200, "stock": 9, "is_active": true}),
            ],
        ))
    }

    #[tokio::test]
    async fn test_cart_commands() {
        let sf = storefront(remote());
        let view = cart_add(&sf, "p1", 2.0).await.unwrap();
        assert_eq!(view.count, 2);
        assert_eq!(view.subtotal, "KES 2,900");

        let view = cart_add(&sf, "p2", 0.0).await.unwrap();
        assert_eq!(view.count, 3);

        let view = cart_set(&sf, "p1", 0.0).await.unwrap();
        assert_eq!(view.count, 1);
        assert!(cart_add(&sf, " ", 1.0).await.is_err());
    }

    #[tokio::test]
    async fn test_products_by_category() {
        let sf = storefront(remote());
        let hair = products(&sf, Some(Category::Hair)).await;
        assert_eq!(hair.len(), 1);
        assert_eq!(products(&sf, None).await.len(), 2);
    }

    #[tokio::test]
    async fn test_wishlist_move_to_cart() {
        let sf = storefront(remote());
        assert!(wishlist_toggle(&sf, "p2").unwrap().in_wishlist);
        let view = wishlist_move_to_cart(&sf, "p2").await.unwrap();
        assert_eq!(view.count, 1);
        assert!(wishlist_show(&sf).is_empty());
    }

    #[tokio::test]
    async fn test_checkout_pay_on_delivery() {
        let remote = remote();
        let sf = storefront(remote.clone());
        cart_add(&sf, "p1", 1.0).await.unwrap();
        let placed = checkout(
            &sf,
            CheckoutArgs {
                method: DeliveryMethod::Courier,
                address: Some("Westlands, Nairobi".to_string()),
                payment: PaymentMode::Delivery,
                ..CheckoutArgs::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(placed.total_label, "KES 1,450");
        assert!(placed.reference.starts_with("ORD-"));
        assert!(sf.cart().is_empty());
        assert_eq!(remote.rows(tables::ORDERS).len(), 1);
    }

    #[tokio::test]
    async fn test_checkout_uses_explicit_pin() {
        let remote = remote();
        let sf = storefront(remote.clone());
        cart_add(&sf, "p2", 1.0).await.unwrap();
        checkout(
            &sf,
            CheckoutArgs {
                latitude: Some(-1.29),
                longitude: Some(36.82),
                payment: PaymentMode::Delivery,
                ..CheckoutArgs::default()
            },
        )
        .await
        .unwrap();
        let row = &remote.rows(tables::ORDERS)[0];
        assert_eq!(row["delivery_location"]["latitude"], -1.29);
    }
}
