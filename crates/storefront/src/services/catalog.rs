//! Product catalog.
//!
//! Read-through cache over the remote `products` table. Entries expire after
//! the configured TTL; nothing else invalidates them. Failures are never
//! cached. The listing reads log them and degrade to empty results;
//! [`Catalog::try_product`] returns them to the caller.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, instrument, warn};

use neemon_core::remote::{Query, RemoteError, RemoteStore, select_as, tables};
use neemon_core::{Category, Product, ProductId};

/// Catalog client shared by the handlers of one process.
#[derive(Clone)]
pub struct Catalog {
    remote: Arc<dyn RemoteStore>,
    cache: Cache<String, Arc<Vec<Product>>>,
}

impl Catalog {
    pub fn new(remote: Arc<dyn RemoteStore>, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(ttl)
            .build();
        Self { remote, cache }
    }

    async fn fetch(&self, cache_key: String, query: &Query) -> Result<Arc<Vec<Product>>, RemoteError> {
        if let Some(products) = self.cache.get(&cache_key).await {
            debug!(cache_key, "catalog cache hit");
            return Ok(products);
        }
        let products = Arc::new(select_as::<Product, _>(self.remote.as_ref(), query).await?);
        self.cache.insert(cache_key, products.clone()).await;
        Ok(products)
    }

    async fn cached(&self, cache_key: String, query: Query) -> Arc<Vec<Product>> {
        match self.fetch(cache_key, &query).await {
            Ok(products) => products,
            Err(e) => {
                warn!(error = %e, table = %query.table, "catalog fetch failed");
                Arc::new(Vec::new())
            }
        }
    }

    /// Listed products with stock.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Vec<Product> {
        let query = Query::from(tables::PRODUCTS)
            .eq("is_active", true)
            .gt("stock", 0);
        self.cached("products".to_owned(), query).await.to_vec()
    }

    /// A listed product by slug, in stock or not.
    #[instrument(skip(self))]
    pub async fn product_by_slug(&self, slug: &str) -> Option<Product> {
        let query = Query::from(tables::PRODUCTS)
            .eq("slug", slug)
            .eq("is_active", true)
            .limit(1);
        self.cached(format!("slug:{slug}"), query).await.first().cloned()
    }

    /// Listed products with stock in one category.
    #[instrument(skip(self))]
    pub async fn products_by_category(&self, category: Category) -> Vec<Product> {
        let query = Query::from(tables::PRODUCTS)
            .eq("category", category.slug())
            .eq("is_active", true)
            .gt("stock", 0);
        self.cached(format!("category:{category}"), query)
            .await
            .to_vec()
    }

    /// Any product by id.
    #[instrument(skip(self))]
    pub async fn product(&self, id: &ProductId) -> Option<Product> {
        self.cached(format!("id:{id}"), Self::by_id(id)).await.first().cloned()
    }

    /// Any product by id, used to price cart lines.
    ///
    /// # Errors
    ///
    /// Returns the remote store's error; `Ok(None)` means no such product.
    #[instrument(skip(self))]
    pub async fn try_product(&self, id: &ProductId) -> Result<Option<Product>, RemoteError> {
        let products = self.fetch(format!("id:{id}"), &Self::by_id(id)).await?;
        Ok(products.first().cloned())
    }

    fn by_id(id: &ProductId) -> Query {
        Query::from(tables::PRODUCTS).eq("id", id.as_str()).limit(1)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use neemon_core::remote::MemoryRemote;
    use serde_json::json;

    pub(crate) fn seeded_remote() -> MemoryRemote {
        MemoryRemote::new().with_rows(
            tables::PRODUCTS,
            vec![
                json!({"id": "p1", "slug": "velvet-lipstick", "name": "Velvet Lipstick", "brand": "Neemon",
                       "category": "makeup", "price": 1450, "stock": 4, "is_active": true}),
                json!({"id": "p2", "slug": "glow-serum", "name": "Glow Serum", "brand": "Neemon",
                       "category": "skincare", "price": "2900.00", "stock": 0, "is_active": true}),
                json!({"id": "p3", "slug": "old-palette", "name": "Old Palette", "brand": "Neemon",
                       "category": "makeup", "price": 800, "stock": 9, "is_active": false}),
            ],
        )
    }

    fn catalog(remote: Arc<MemoryRemote>) -> Catalog {
        Catalog::new(remote, Duration::from_secs(300))
    }

    #[tokio::test]
    async fn test_products_are_active_and_in_stock() {
        let catalog = catalog(Arc::new(seeded_remote()));
        let ids: Vec<_> = catalog
            .products()
            .await
            .into_iter()
            .map(|p| p.id.into_inner())
            .collect();
        assert_eq!(ids, vec!["p1"]);
        assert!(catalog.products_by_category(Category::Skincare).await.is_empty());
    }

    #[tokio::test]
    async fn test_slug_lookup_ignores_stock_but_not_active() {
        let catalog = catalog(Arc::new(seeded_remote()));
        assert_eq!(
            catalog.product_by_slug("glow-serum").await.unwrap().name,
            "Glow Serum"
        );
        assert!(catalog.product_by_slug("old-palette").await.is_none());
        assert!(
            catalog
                .product(&ProductId::parse("p3").unwrap())
                .await
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_results_are_cached_until_ttl() {
        let remote = Arc::new(seeded_remote());
        let catalog = catalog(remote.clone());
        assert_eq!(catalog.products().await.len(), 1);

        remote
            .update(
                tables::PRODUCTS,
                json!({"stock": 10}),
                &[neemon_core::remote::Filter::eq("id", "p2")],
            )
            .await
            .unwrap();
        assert_eq!(catalog.products().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failures_degrade_to_empty_and_are_not_cached() {
        let remote = Arc::new(seeded_remote());
        let catalog = catalog(remote.clone());
        remote.fail_next("connection refused");
        assert!(catalog.products().await.is_empty());
        assert_eq!(catalog.products().await.len(), 1);
    }

    #[tokio::test]
    async fn test_try_product_separates_failure_from_absence() {
        let remote = Arc::new(seeded_remote());
        let catalog = catalog(remote.clone());
        remote.fail_next("connection refused");
        let err = catalog.try_product(&ProductId::parse("p1").unwrap()).await.unwrap_err();
        assert_eq!(err.to_string(), "connection refused");

        assert!(catalog.try_product(&ProductId::parse("p1").unwrap()).await.unwrap().is_some());
        assert!(catalog.try_product(&ProductId::parse("p9").unwrap()).await.unwrap().is_none());
    }
}
