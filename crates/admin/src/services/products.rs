//! Catalog maintenance.
//!
//! Unlike the storefront catalog, every product is visible here, including
//! hidden and sold-out ones, and nothing is cached.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument};

use neemon_core::remote::{Filter, Query, RemoteError, RemoteStore, insert_one, select_as, tables};
use neemon_core::{Product, ProductDraft, ProductId};

use crate::error::{AppError, Result};

/// Reads and writes rows of the `products` table.
#[derive(Clone)]
pub struct ProductService {
    remote: Arc<dyn RemoteStore>,
}

impl ProductService {
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self { remote }
    }

    /// All products, newest first.
    ///
    /// # Errors
    ///
    /// Returns the remote store's error.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Product>> {
        let query = Query::from(tables::PRODUCTS).order("created_at", false);
        Ok(select_as(self.remote.as_ref(), &query).await?)
    }

    /// One product by id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no row has this id.
    pub async fn get(&self, id: &ProductId) -> Result<Product> {
        let query = Query::from(tables::PRODUCTS).eq("id", id.as_str()).limit(1);
        select_as::<Product, _>(self.remote.as_ref(), &query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("product {id}")))
    }

    /// Create a product from a draft. Ratings start at zero.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::BadRequest`] for an invalid draft, or the remote
    /// store's error (for example a duplicate slug).
    #[instrument(skip(self, draft), fields(slug = %draft.slug))]
    pub async fn create(&self, draft: ProductDraft) -> Result<Product> {
        validate_draft(&draft)?;
        let product = Product {
            id: ProductId::generate(),
            slug: draft.slug.trim().to_owned(),
            name: draft.name.trim().to_owned(),
            brand: draft.brand.trim().to_owned(),
            category: draft.category,
            price: draft.price,
            image_url: draft.image_url,
            description: draft.description,
            stock: draft.stock,
            rating: 0.0,
            reviews_count: 0,
            is_active: draft.is_active,
            created_at: Some(Utc::now()),
        };
        insert_one(self.remote.as_ref(), tables::PRODUCTS, &product).await?;
        info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Replace the seller-editable fields of a product.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for an unknown product,
    /// [`AppError::BadRequest`] for an invalid draft, or the remote store's
    /// error.
    #[instrument(skip(self, draft))]
    pub async fn update(&self, id: &ProductId, draft: ProductDraft) -> Result<Product> {
        validate_draft(&draft)?;
        self.get(id).await?;
        let patch =
            serde_json::to_value(&draft).map_err(|e| RemoteError::Decode(e.to_string()))?;
        self.remote
            .update(tables::PRODUCTS, patch, &[Filter::eq("id", id.as_str())])
            .await?;
        self.get(id).await
    }

    /// Flip `is_active`, hiding or re-listing the product.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for an unknown product, or the remote
    /// store's error.
    #[instrument(skip(self))]
    pub async fn toggle_active(&self, id: &ProductId) -> Result<Product> {
        let mut product = self.get(id).await?;
        product.is_active = !product.is_active;
        self.remote
            .update(
                tables::PRODUCTS,
                json!({ "is_active": product.is_active }),
                &[Filter::eq("id", id.as_str())],
            )
            .await?;
        info!(product_id = %id, is_active = product.is_active, "Product visibility changed");
        Ok(product)
    }

    /// Number of products, listed or not, with stock strictly below
    /// `threshold`.
    ///
    /// # Errors
    ///
    /// Returns the remote store's error.
    pub async fn low_stock_count(&self, threshold: i32) -> Result<u64> {
        let query = Query::from(tables::PRODUCTS).lt("stock", threshold);
        Ok(self.remote.count(&query).await?)
    }
}

fn validate_draft(draft: &ProductDraft) -> Result<()> {
    for (field, value) in [
        ("slug", &draft.slug),
        ("name", &draft.name),
        ("brand", &draft.brand),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::BadRequest(format!("{field} is required")));
        }
    }
    if draft.price.is_sign_negative() {
        return Err(AppError::BadRequest("price cannot be negative".to_string()));
    }
    if draft.stock < 0 {
        return Err(AppError::BadRequest("stock cannot be negative".to_string()));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use neemon_core::Category;
    use neemon_core::remote::MemoryRemote;
    use rust_decimal::Decimal;

    fn service() -> (Arc<MemoryRemote>, ProductService) {
        let remote = Arc::new(MemoryRemote::new().with_rows(
            tables::PRODUCTS,
            vec![
                json!({"id": "p1", "slug": "velvet-lipstick", "name": "Velvet Lipstick",
                       "brand": "Neemon", "category": "makeup", "price": 1450, "stock": 4,
                       "is_active": true, "created_at": "2025-01-10T08:00:00Z"}),
                json!({"id": "p2", "slug": "argan-oil", "name": "Argan Oil",
                       "brand": "Neemon", "category": "hair", "price": 2200, "stock": 40,
                       "is_active": true, "created_at": "2025-02-10T08:00:00Z"}),
                json!({"id": "p3", "slug": "old-palette", "name": "Old Palette",
                       "brand": "Neemon", "category": "makeup", "price": 900, "stock": 0,
                       "is_active": false, "created_at": "2024-12-01T08:00:00Z"}),
            ],
        ));
        (remote.clone(), ProductService::new(remote))
    }

    fn draft(slug: &str) -> ProductDraft {
        ProductDraft {
            slug: slug.to_string(),
            name: "Shea Body Butter".to_string(),
            brand: "Neemon".to_string(),
            category: Category::Skincare,
            price: Decimal::new(1800, 0),
            image_url: String::new(),
            description: "Whipped shea".to_string(),
            stock: 12,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_list_includes_hidden_newest_first() {
        let (_, products) = service();
        let ids: Vec<String> = products
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id.into_inner())
            .collect();
        assert_eq!(ids, ["p2", "p1", "p3"]);
    }

    #[tokio::test]
    async fn test_create_then_list_first() {
        let (remote, products) = service();
        let created = products.create(draft("shea-butter")).await.unwrap();
        assert_eq!(created.reviews_count, 0);
        assert_eq!(remote.rows(tables::PRODUCTS).len(), 4);
        assert_eq!(products.list().await.unwrap()[0].id, created.id);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let (remote, products) = service();
        let mut bad = draft("x");
        bad.name = "  ".to_string();
        let err = products.create(bad).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(remote.insert_calls(), 0);
    }

    #[tokio::test]
    async fn test_update_replaces_fields() {
        let (_, products) = service();
        let id = ProductId::parse("p1").unwrap();
        let mut edit = draft("velvet-lipstick");
        edit.stock = 25;
        let updated = products.update(&id, edit).await.unwrap();
        assert_eq!(updated.name, "Shea Body Butter");
        assert_eq!(updated.stock, 25);
        assert_eq!(updated.category, Category::Skincare);
    }

    #[tokio::test]
    async fn test_update_unknown_is_not_found() {
        let (_, products) = service();
        let err = products
            .update(&ProductId::parse("nope").unwrap(), draft("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_toggle_active_twice_restores() {
        let (_, products) = service();
        let id = ProductId::parse("p1").unwrap();
        assert!(!products.toggle_active(&id).await.unwrap().is_active);
        assert!(!products.get(&id).await.unwrap().is_active);
        assert!(products.toggle_active(&id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_low_stock_count_includes_hidden() {
        let (_, products) = service();
        assert_eq!(products.low_stock_count(10).await.unwrap(), 2);
        assert_eq!(products.low_stock_count(4).await.unwrap(), 1);
    }
}
