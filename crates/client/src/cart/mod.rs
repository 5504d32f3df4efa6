//! Hybrid cart: one view model over the guest and server carts.
//!
//! Guest and server cart lines arrive in different shapes; everything
//! downstream (pricing, shipping manifests, checkout) works on the one
//! [`CartLine`] type produced by the two adapters here. The hybrid cart
//! also owns the one-shot migration that drains the guest cart into the
//! server cart when a session first becomes available.

pub mod guest;
pub mod pricing;

pub use guest::GuestCartStore;
pub use pricing::{Totals, price_lines};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, instrument, warn};

use autonorte_core::{Pesos, ProductId};

use crate::api::{CartClient, CatalogClient, Product, ServerCartLine};
use crate::error::Result;
use crate::session::SessionCoordinator;
use crate::storage::GuestCartMap;

/// One line of the unified cart view model. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    /// Unit price, IVA included.
    pub unit_price: Pesos,
    pub quantity: u32,
    /// `unit_price * quantity`.
    pub line_subtotal: Pesos,
}

impl CartLine {
    /// Build a line from a guest cart entry joined with its product.
    #[must_use]
    pub fn from_guest_entry(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            unit_price: product.price,
            quantity,
            line_subtotal: product.price.times(quantity),
        }
    }

    /// Build a line from a server cart response line.
    #[must_use]
    pub fn from_server_line(line: ServerCartLine) -> Self {
        Self {
            product_id: line.product_id,
            name: line.product,
            unit_price: line.price,
            quantity: line.quantity,
            line_subtotal: line.price.times(line.quantity),
        }
    }
}

/// Which cart absorbed a hybrid operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartKind {
    /// Authenticated server cart.
    Server,
    /// Local guest cart.
    Guest,
}

/// Result of a guest-cart migration pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Guest cart was empty; nothing to do.
    Nothing,
    /// No session available; guest cart left untouched.
    SkippedAnonymous,
    /// Every entry reached the server cart; guest cart discarded.
    Completed {
        /// Total items migrated (sum of quantities).
        items: u32,
    },
    /// Some adds failed; only the failed entries were written back for
    /// a later retry.
    Partial {
        /// Items that reached the server cart.
        migrated: u32,
        /// Entries retained locally.
        retained: usize,
    },
}

/// The hybrid cart orchestrating guest and server state.
#[derive(Clone)]
pub struct HybridCart {
    inner: Arc<HybridInner>,
}

struct HybridInner {
    guest: GuestCartStore,
    server: CartClient,
    catalog: CatalogClient,
    session: SessionCoordinator,
    auto_migrated: AtomicBool,
}

impl HybridCart {
    /// Create a hybrid cart over the given components.
    #[must_use]
    pub fn new(
        guest: GuestCartStore,
        server: CartClient,
        catalog: CatalogClient,
        session: SessionCoordinator,
    ) -> Self {
        Self {
            inner: Arc::new(HybridInner {
                guest,
                server,
                catalog,
                session,
                auto_migrated: AtomicBool::new(false),
            }),
        }
    }

    /// Direct access to the guest cart (quantity edits on the cart page).
    #[must_use]
    pub fn guest(&self) -> &GuestCartStore {
        &self.inner.guest
    }

    /// Direct access to the server cart proxy.
    #[must_use]
    pub fn server(&self) -> &CartClient {
        &self.inner.server
    }

    /// Add a product to whichever cart applies: the server cart when a
    /// valid session exists, the guest cart otherwise.
    ///
    /// # Errors
    ///
    /// Server-side failures propagate; guest-side failures are only
    /// `Storage`.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add(&self, product_id: ProductId, quantity: u32) -> Result<CartKind> {
        if self.inner.session.token_if_available().await.is_some() {
            self.inner.server.add_item(product_id, quantity).await?;
            Ok(CartKind::Server)
        } else {
            self.inner.guest.add(product_id, quantity)?;
            debug!("product added to guest cart");
            Ok(CartKind::Guest)
        }
    }

    /// The unified cart lines.
    ///
    /// For an authenticated session this first runs the one-shot guest
    /// migration, then maps the server cart; for a guest it prices the
    /// local map against the catalog.
    ///
    /// # Errors
    ///
    /// Propagates server, catalog and storage failures.
    #[instrument(skip(self))]
    pub async fn lines(&self) -> Result<Vec<CartLine>> {
        if self.inner.session.is_authenticated().await {
            self.ensure_migrated().await?;
            let server_lines = self.inner.server.fetch().await?;
            Ok(server_lines
                .into_iter()
                .map(CartLine::from_server_line)
                .collect())
        } else {
            self.inner.guest.materialize(&self.inner.catalog).await
        }
    }

    /// Total item count across whichever cart is active (header badge).
    ///
    /// Falls back to the guest count when the server count fails, so the
    /// badge degrades instead of erroring.
    ///
    /// # Errors
    ///
    /// `Storage` if the guest store fails.
    pub async fn total_items(&self) -> Result<u32> {
        if self.inner.session.token_if_available().await.is_some() {
            match self.inner.server.count().await {
                Ok(count) => return Ok(count),
                Err(err) => warn!(%err, "server cart count failed, using guest count"),
            }
        }
        self.inner.guest.total_items()
    }

    /// Drain the guest cart into the server cart.
    ///
    /// Adds are issued sequentially in insertion order (the server
    /// recomputes totals per call, so concurrent adds race). After every
    /// entry has been attempted the guest store is rewritten exactly
    /// once: cleared on full success, or replaced with only the failed
    /// entries so a later pass can retry them.
    ///
    /// # Errors
    ///
    /// `Storage` if the guest store cannot be read or rewritten.
    /// Individual add failures do not error; they show up in the
    /// [`MigrationOutcome`].
    #[instrument(skip(self))]
    pub async fn migrate_guest_cart(&self) -> Result<MigrationOutcome> {
        let entries = self.inner.guest.entries()?;
        if entries.is_empty() {
            return Ok(MigrationOutcome::Nothing);
        }
        if self.inner.session.token_if_available().await.is_none() {
            warn!("cannot migrate guest cart without a session");
            return Ok(MigrationOutcome::SkippedAnonymous);
        }

        let mut migrated: u32 = 0;
        let mut failed = GuestCartMap::new();
        for (product_id, quantity) in &entries {
            match self.inner.server.add_item(*product_id, *quantity).await {
                Ok(()) => migrated += quantity,
                Err(err) => {
                    warn!(%product_id, %err, "guest cart entry failed to migrate");
                    failed.insert(*product_id, *quantity);
                }
            }
        }

        if failed.is_empty() {
            self.inner.guest.clear()?;
            debug!(items = migrated, "guest cart migrated");
            Ok(MigrationOutcome::Completed { items: migrated })
        } else {
            let retained = failed.len();
            self.inner.guest.replace(&failed)?;
            warn!(retained, "guest cart partially migrated, retaining failures");
            Ok(MigrationOutcome::Partial { migrated, retained })
        }
    }

    /// Run the migration at most once per session object. Later calls
    /// are no-ops even if the first pass left retained entries - those
    /// are retried by the next page session or an explicit
    /// [`Self::migrate_guest_cart`] call (checkout does one).
    async fn ensure_migrated(&self) -> Result<()> {
        if self.inner.auto_migrated.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.migrate_guest_cart().await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use autonorte_core::Pesos;

    use super::*;

    #[test]
    fn test_cart_line_from_guest_entry() {
        let product = Product {
            id: ProductId::new(5),
            name: "Filtro de aceite".to_string(),
            price: Pesos::new(1190),
            stock: Some(4),
            weight_kg: None,
            length_cm: None,
            width_cm: None,
            height_cm: None,
        };
        let line = CartLine::from_guest_entry(&product, 2);
        assert_eq!(line.line_subtotal, Pesos::new(2380));
        assert_eq!(line.quantity, 2);
    }

    #[test]
    fn test_cart_line_adapters_agree() {
        let product = Product {
            id: ProductId::new(7),
            name: "Bujía NGK".to_string(),
            price: Pesos::new(2380),
            stock: None,
            weight_kg: None,
            length_cm: None,
            width_cm: None,
            height_cm: None,
        };
        let from_guest = CartLine::from_guest_entry(&product, 3);

        let from_server = CartLine::from_server_line(ServerCartLine {
            product_id: ProductId::new(7),
            product: "Bujía NGK".to_string(),
            price: Pesos::new(2380),
            quantity: 3,
        });

        // Same source data through either adapter is the same line.
        assert_eq!(from_guest, from_server);
    }
}
