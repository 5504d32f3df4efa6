//! Shipping quote negotiation.
//!
//! Wraps the carrier client with the state the cart page needs: the
//! last quote set, which option is selected, and whether that selection
//! is still good for the cart and destination it was priced against.
//!
//! A quote set is only as fresh as the manifest it was computed from.
//! Every set carries the destination and a fingerprint of the cart
//! lines; any later mismatch invalidates it, and checkout refuses to
//! proceed on a stale or absent selection when delivery is by carrier.

use std::sync::Mutex;

use tracing::{debug, instrument, warn};

use autonorte_core::{Pesos, ProductId};

use crate::api::{CatalogClient, Destination, Manifest, ShippingClient, ShippingQuote};
use crate::cart::{CartLine, Totals};
use crate::checkout::ValidationError;
use crate::error::{Result, StoreError};

/// Per-line fallback weight when the product lacks one.
pub const FALLBACK_WEIGHT_KG: f64 = 1.0;
/// Per-line fallback for each missing dimension.
pub const FALLBACK_DIMENSION_CM: f64 = 10.0;

/// Cart identity a quote set was priced against: (id, quantity) pairs,
/// sorted so line order does not matter.
type Fingerprint = Vec<(ProductId, u32)>;

fn fingerprint(lines: &[CartLine]) -> Fingerprint {
    let mut pairs: Fingerprint = lines
        .iter()
        .map(|line| (line.product_id, line.quantity))
        .collect();
    pairs.sort_unstable();
    pairs
}

/// Dimensional data for one line, after fallbacks.
#[derive(Debug, Clone, Copy)]
struct LineDims {
    quantity: u32,
    weight_kg: f64,
    length_cm: f64,
    width_cm: f64,
    height_cm: f64,
}

/// Fold per-line dimensions into one package the carrier can price:
/// weights and lengths stack, width and height take the widest line.
fn fold_manifest(dims: &[LineDims]) -> Manifest {
    let mut manifest = Manifest {
        weight_kg: 0.0,
        length_cm: 0.0,
        width_cm: 0.0,
        height_cm: 0.0,
    };
    for line in dims {
        let quantity = f64::from(line.quantity);
        manifest.weight_kg += line.weight_kg * quantity;
        manifest.length_cm += line.length_cm * quantity;
        manifest.width_cm = manifest.width_cm.max(line.width_cm);
        manifest.height_cm = manifest.height_cm.max(line.height_cm);
    }
    manifest
}

struct ActiveQuotes {
    destination: Destination,
    fingerprint: Fingerprint,
    /// Gross merchandise value at request time, kept so a selection
    /// change can recompute totals without refetching the cart.
    gross: Pesos,
    quotes: Vec<ShippingQuote>,
    selected: usize,
}

/// Tracks carrier quotes and the user's selection.
pub struct ShippingQuoteNegotiator {
    client: ShippingClient,
    catalog: CatalogClient,
    state: Mutex<Option<ActiveQuotes>>,
}

impl ShippingQuoteNegotiator {
    /// Create a negotiator over the carrier and catalog clients.
    #[must_use]
    pub fn new(client: ShippingClient, catalog: CatalogClient) -> Self {
        Self {
            client,
            catalog,
            state: Mutex::new(None),
        }
    }

    /// Request quotes for the given destination and cart lines.
    ///
    /// On success the set becomes current with option 0 selected. On
    /// failure any previous set is discarded - a stale set must not
    /// outlive a failed recalculation.
    ///
    /// # Errors
    ///
    /// `Validation(EmptyCart)` for an empty cart, `NoCoverage` when the
    /// carrier has nothing for the destination, `Network`/
    /// `ServerRejected` otherwise.
    #[instrument(skip(self, lines), fields(comuna = %destination.comuna))]
    pub async fn request_quotes(
        &self,
        destination: Destination,
        lines: &[CartLine],
    ) -> Result<Vec<ShippingQuote>> {
        if lines.is_empty() {
            return Err(ValidationError::EmptyCart.into());
        }

        let manifest = self.manifest_for(lines).await;
        match self.client.request_quotes(&destination, &manifest).await {
            Ok(quotes) => {
                debug!(options = quotes.len(), "carrier quotes received");
                let gross: Pesos = lines.iter().map(|line| line.line_subtotal).sum();
                *self.lock() = Some(ActiveQuotes {
                    destination,
                    fingerprint: fingerprint(lines),
                    gross,
                    quotes: quotes.clone(),
                    selected: 0,
                });
                Ok(quotes)
            }
            Err(err) => {
                *self.lock() = None;
                Err(err)
            }
        }
    }

    /// Switch the selected option and synchronously recompute totals
    /// from the gross captured at request time, so no caller can read a
    /// stale grand total after the switch.
    ///
    /// # Errors
    ///
    /// `NotFound` when no quote set is current or the index is out of
    /// range; the previous selection stays in place.
    pub fn select(&self, index: usize) -> Result<(ShippingQuote, Totals)> {
        let mut state = self.lock();
        let active = state
            .as_mut()
            .ok_or_else(|| StoreError::NotFound("no shipping quotes requested".to_string()))?;
        let quote = active
            .quotes
            .get(index)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("shipping option {index}")))?;
        active.selected = index;

        let net = active.gross.net_of_iva();
        let totals = Totals {
            net,
            iva: active.gross - net,
            shipping: quote.cost,
            grand_total: active.gross + quote.cost,
        };
        debug!(option = %quote.name, cost = %quote.cost, "shipping option selected");
        Ok((quote, totals))
    }

    /// The currently selected quote, regardless of freshness. Used by
    /// checkout's no-network validation step.
    #[must_use]
    pub fn selected_quote(&self) -> Option<ShippingQuote> {
        let state = self.lock();
        let active = state.as_ref()?;
        active.quotes.get(active.selected).cloned()
    }

    /// The selected cost if the quote set still matches these cart
    /// lines; `None` when the cart changed since pricing.
    #[must_use]
    pub fn cost_if_current(&self, lines: &[CartLine]) -> Option<Pesos> {
        let state = self.lock();
        let active = state.as_ref()?;
        if active.fingerprint == fingerprint(lines) {
            active.quotes.get(active.selected).map(|quote| quote.cost)
        } else {
            None
        }
    }

    /// The selected quote if it is still valid for this destination and
    /// cart. Checkout refuses a ship order without one.
    #[must_use]
    pub fn quote_for_checkout(
        &self,
        destination: &Destination,
        lines: &[CartLine],
    ) -> Option<ShippingQuote> {
        let state = self.lock();
        let active = state.as_ref()?;
        if &active.destination == destination && active.fingerprint == fingerprint(lines) {
            active.quotes.get(active.selected).cloned()
        } else {
            None
        }
    }

    /// The underlying carrier client (coverage catalogs).
    #[must_use]
    pub fn carrier(&self) -> &ShippingClient {
        &self.client
    }

    /// Discard the current quote set (pickup switch, cart mutation).
    pub fn invalidate(&self) {
        if self.lock().take().is_some() {
            debug!("shipping quote set invalidated");
        }
    }

    /// Derive the carrier manifest from cart lines, resolving dimensions
    /// through the catalog with per-line fallbacks.
    async fn manifest_for(&self, lines: &[CartLine]) -> Manifest {
        let mut dims = Vec::with_capacity(lines.len());
        for line in lines {
            let product = match self.catalog.product(line.product_id).await {
                Ok(product) => Some(product),
                Err(err) => {
                    warn!(
                        product_id = %line.product_id,
                        %err,
                        "manifest falling back to default dimensions"
                    );
                    None
                }
            };
            let product = product.as_ref();
            dims.push(LineDims {
                quantity: line.quantity,
                weight_kg: product
                    .and_then(|p| p.weight_kg)
                    .unwrap_or(FALLBACK_WEIGHT_KG),
                length_cm: product
                    .and_then(|p| p.length_cm)
                    .unwrap_or(FALLBACK_DIMENSION_CM),
                width_cm: product
                    .and_then(|p| p.width_cm)
                    .unwrap_or(FALLBACK_DIMENSION_CM),
                height_cm: product
                    .and_then(|p| p.height_cm)
                    .unwrap_or(FALLBACK_DIMENSION_CM),
            });
        }
        fold_manifest(&dims)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<ActiveQuotes>> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
