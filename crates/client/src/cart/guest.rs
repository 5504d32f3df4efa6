//! Local cart for anonymous shoppers.
//!
//! Quantities only - pricing happens by resolving each id against the
//! public catalog when the cart is displayed or migrated. The map lives
//! in the credential store next to the token and is discarded after a
//! successful migration into the server cart.

use std::sync::Arc;

use tracing::warn;

use autonorte_core::ProductId;

use crate::api::CatalogClient;
use crate::cart::CartLine;
use crate::error::Result;
use crate::storage::{CredentialStore, GuestCartMap};

/// Guest cart operations over the credential store.
#[derive(Clone)]
pub struct GuestCartStore {
    store: Arc<dyn CredentialStore>,
}

impl GuestCartStore {
    /// Create a guest cart view over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Add `quantity` units of a product (no-op for zero).
    ///
    /// # Errors
    ///
    /// `Storage` if the underlying store fails.
    pub fn add(&self, product_id: ProductId, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Ok(());
        }
        let mut cart = self.store.guest_cart()?;
        *cart.entry(product_id).or_insert(0) += quantity;
        self.store.set_guest_cart(&cart)?;
        Ok(())
    }

    /// Set a line's quantity; zero or negative removes the line.
    ///
    /// # Errors
    ///
    /// `Storage` if the underlying store fails.
    pub fn set_quantity(&self, product_id: ProductId, quantity: i32) -> Result<()> {
        let mut cart = self.store.guest_cart()?;
        if quantity <= 0 {
            cart.shift_remove(&product_id);
        } else {
            cart.insert(product_id, quantity.unsigned_abs());
        }
        self.store.set_guest_cart(&cart)?;
        Ok(())
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// `Storage` if the underlying store fails.
    pub fn remove(&self, product_id: ProductId) -> Result<()> {
        let mut cart = self.store.guest_cart()?;
        cart.shift_remove(&product_id);
        self.store.set_guest_cart(&cart)?;
        Ok(())
    }

    /// Total item count (sum of quantities).
    ///
    /// # Errors
    ///
    /// `Storage` if the underlying store fails.
    pub fn total_items(&self) -> Result<u32> {
        Ok(self.store.guest_cart()?.values().sum())
    }

    /// Snapshot of the entries in insertion order.
    ///
    /// # Errors
    ///
    /// `Storage` if the underlying store fails.
    pub fn entries(&self) -> Result<GuestCartMap> {
        Ok(self.store.guest_cart()?)
    }

    /// Whether the cart has no entries.
    ///
    /// # Errors
    ///
    /// `Storage` if the underlying store fails.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.store.guest_cart()?.is_empty())
    }

    /// Replace the whole cart in one write (migration retain path).
    ///
    /// # Errors
    ///
    /// `Storage` if the underlying store fails.
    pub fn replace(&self, cart: &GuestCartMap) -> Result<()> {
        self.store.set_guest_cart(cart)?;
        Ok(())
    }

    /// Discard the cart in one write.
    ///
    /// # Errors
    ///
    /// `Storage` if the underlying store fails.
    pub fn clear(&self) -> Result<()> {
        self.store.clear_guest_cart()?;
        Ok(())
    }

    /// Resolve every entry against the catalog and produce priced cart
    /// lines. Entries whose product lookup fails are dropped with a
    /// warning - a half-priced cart beats an empty page.
    ///
    /// # Errors
    ///
    /// `Storage` if the underlying store fails. Lookup failures are not
    /// errors.
    pub async fn materialize(&self, catalog: &CatalogClient) -> Result<Vec<CartLine>> {
        let entries = self.store.guest_cart()?;
        let mut lines = Vec::with_capacity(entries.len());
        for (product_id, quantity) in &entries {
            match catalog.product(*product_id).await {
                Ok(product) => lines.push(CartLine::from_guest_entry(&product, *quantity)),
                Err(err) => {
                    warn!(%product_id, %err, "dropping guest cart entry, product lookup failed");
                }
            }
        }
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use autonorte_core::Pesos;

    use super::*;
    use crate::storage::MemoryStore;

    fn guest_store() -> GuestCartStore {
        GuestCartStore::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_add_accumulates_quantity() {
        let cart = guest_store();
        cart.add(ProductId::new(5), 1).unwrap();
        cart.add(ProductId::new(5), 2).unwrap();
        cart.add(ProductId::new(7), 1).unwrap();

        assert_eq!(cart.total_items().unwrap(), 4);
        let entries = cart.entries().unwrap();
        assert_eq!(entries[&ProductId::new(5)], 3);
    }

    #[test]
    fn test_set_quantity_zero_removes_line() {
        let cart = guest_store();
        cart.add(ProductId::new(5), 2).unwrap();
        cart.set_quantity(ProductId::new(5), 0).unwrap();
        assert!(cart.is_empty().unwrap());

        cart.add(ProductId::new(7), 1).unwrap();
        cart.set_quantity(ProductId::new(7), -3).unwrap();
        assert!(cart.is_empty().unwrap());
    }

    #[test]
    fn test_insertion_order_preserved() {
        let cart = guest_store();
        cart.add(ProductId::new(9), 1).unwrap();
        cart.add(ProductId::new(2), 1).unwrap();
        cart.add(ProductId::new(5), 1).unwrap();
        cart.remove(ProductId::new(2)).unwrap();

        let ids: Vec<_> = cart.entries().unwrap().keys().copied().collect();
        assert_eq!(ids, vec![ProductId::new(9), ProductId::new(5)]);
    }

    #[tokio::test]
    async fn test_materialize_drops_failed_lookups() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products/5/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 5, "name": "Filtro de aceite", "price": 1190
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/products/99/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let cart = guest_store();
        cart.add(ProductId::new(5), 2).unwrap();
        cart.add(ProductId::new(99), 1).unwrap();

        let catalog = CatalogClient::new(reqwest::Client::new(), server.uri());
        let lines = cart.materialize(&catalog).await.unwrap();

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].product_id, ProductId::new(5));
        assert_eq!(lines[0].line_subtotal, Pesos::new(2380));
        // The store itself is untouched by a failed lookup.
        assert_eq!(cart.total_items().unwrap(), 3);
    }
}
