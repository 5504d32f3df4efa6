//! Public product catalog client.
//!
//! Guest carts only store quantities, so pricing a guest cart means
//! resolving every product id against this endpoint. Lookups are cached
//! with `moka` (5-minute TTL) - product data changes rarely and the
//! guest cart page hits the same handful of ids repeatedly.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Deserialize;
use tracing::{debug, instrument};

use autonorte_core::{Pesos, ProductId};

use crate::error::{Result, StoreError};

/// A catalog product as returned by the public lookup endpoint.
///
/// Dimensional fields feed the shipping manifest and are optional;
/// lines fall back to fixed defaults when the product lacks them.
#[derive(Debug, Clone, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Unit price, IVA included.
    pub price: Pesos,
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub length_cm: Option<f64>,
    #[serde(default)]
    pub width_cm: Option<f64>,
    #[serde(default)]
    pub height_cm: Option<f64>,
}

/// Client for the public product catalog.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    http: reqwest::Client,
    api_base: String,
    cache: Cache<ProductId, Product>,
}

impl CatalogClient {
    /// Create a new catalog client.
    #[must_use]
    pub fn new(http: reqwest::Client, api_base: impl Into<String>) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(CatalogInner {
                http,
                api_base: api_base.into(),
                cache,
            }),
        }
    }

    /// Look up a product by id.
    ///
    /// # Errors
    ///
    /// `NotFound` if the id does not exist, `ServerRejected`/`Network`
    /// on backend or transport failure.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Product> {
        if let Some(product) = self.inner.cache.get(&id).await {
            debug!("cache hit for product");
            return Ok(product);
        }

        let url = format!("{}/api/products/{id}/", self.inner.api_base);
        let response = self.inner.http.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(format!("product {id}")));
        }
        if !response.status().is_success() {
            return Err(super::rejection(response).await);
        }

        let product: Product = super::parse_json(response).await?;
        self.inner.cache.insert(id, product.clone()).await;
        Ok(product)
    }

    /// Drop a cached product (used after admin-side price edits).
    pub async fn invalidate(&self, id: ProductId) {
        self.inner.cache.invalidate(&id).await;
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn product_body() -> serde_json::Value {
        serde_json::json!({
            "id": 5,
            "name": "Filtro de aceite",
            "price": 1190,
            "stock": 12,
            "weight_kg": 0.4,
        })
    }

    #[tokio::test]
    async fn test_product_lookup_and_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products/5/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(product_body()))
            .expect(1)
            .mount(&server)
            .await;

        let catalog = CatalogClient::new(reqwest::Client::new(), server.uri());

        let first = catalog.product(ProductId::new(5)).await.unwrap();
        assert_eq!(first.name, "Filtro de aceite");
        assert_eq!(first.price, Pesos::new(1190));
        assert_eq!(first.length_cm, None);

        // Second lookup is served from cache (expect(1) above).
        let second = catalog.product(ProductId::new(5)).await.unwrap();
        assert_eq!(second.price, first.price);
    }

    #[tokio::test]
    async fn test_product_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products/99/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let catalog = CatalogClient::new(reqwest::Client::new(), server.uri());
        let err = catalog.product(ProductId::new(99)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
