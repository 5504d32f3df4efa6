//! The storefront session: one context object owning every component.
//!
//! Replaces the page-wide globals of older storefront clients with an
//! explicit session scoped to one page lifetime. Construct it when the
//! page opens; drop it (or call [`StorefrontSession::logout`]) when the
//! page session ends. All components share the session's HTTP client,
//! credential store and latches.

use std::sync::{Arc, Mutex};

use tracing::debug;

use autonorte_core::{DeliveryType, Pesos, ProductId};

use crate::api::{
    CartClient, CatalogClient, County, Destination, OrderClient, Region, ShippingClient,
    ShippingQuote,
};
use crate::cart::{CartKind, CartLine, GuestCartStore, HybridCart, Totals, price_lines};
use crate::checkout::{CheckoutForm, CheckoutOutcome, CheckoutState, CheckoutSubmitter};
use crate::config::StoreConfig;
use crate::error::Result;
use crate::session::{Profile, RedirectHook, SessionCoordinator};
use crate::shipping::ShippingQuoteNegotiator;
use crate::storage::{CredentialStore, JsonFileStore, MemoryStore};

/// Everything the cart page renders: the unified lines and the totals
/// under the current delivery type and shipping selection.
#[derive(Debug, Clone)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub totals: Totals,
}

/// A storefront client session.
///
/// Cheap to clone; clones share all state including the single-flight
/// and redirect-once latches.
#[derive(Clone)]
pub struct StorefrontSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: StoreConfig,
    session: SessionCoordinator,
    catalog: CatalogClient,
    cart: HybridCart,
    shipping: Arc<ShippingQuoteNegotiator>,
    checkout: CheckoutSubmitter,
    /// Mirrors the delivery-type selector on the cart page; gates the
    /// shipping cost in [`StorefrontSession::cart_view`].
    delivery: Mutex<Option<DeliveryType>>,
}

impl StorefrontSession {
    /// Create a session from configuration, with no redirect hook.
    ///
    /// # Errors
    ///
    /// `Network` if the HTTP client cannot be constructed.
    pub fn new(config: StoreConfig) -> Result<Self> {
        Self::with_redirect_hook(config, None)
    }

    /// Create a session with a login-redirect hook. The hook fires at
    /// most once per session, when authentication cannot be recovered.
    ///
    /// # Errors
    ///
    /// `Network` if the HTTP client cannot be constructed.
    pub fn with_redirect_hook(config: StoreConfig, hook: Option<RedirectHook>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            // The session-exchange endpoint authenticates by cookie.
            .cookie_store(true)
            .build()?;

        let store: Arc<dyn CredentialStore> = match &config.state_file {
            Some(path) => Arc::new(JsonFileStore::new(path)),
            None => Arc::new(MemoryStore::new()),
        };

        Ok(Self::assemble(config, http, store, hook))
    }

    /// Create a session over an explicit store (tests, embedders with
    /// their own persistence).
    #[must_use]
    pub fn with_store(
        config: StoreConfig,
        http: reqwest::Client,
        store: Arc<dyn CredentialStore>,
        hook: Option<RedirectHook>,
    ) -> Self {
        Self::assemble(config, http, store, hook)
    }

    fn assemble(
        config: StoreConfig,
        http: reqwest::Client,
        store: Arc<dyn CredentialStore>,
        hook: Option<RedirectHook>,
    ) -> Self {
        let api_base = config.api_base.clone();
        let session = SessionCoordinator::new(http.clone(), &api_base, Arc::clone(&store), hook);
        let catalog = CatalogClient::new(http.clone(), &api_base);
        let server_cart = CartClient::new(http.clone(), &api_base, session.clone());
        let guest_cart = GuestCartStore::new(store);
        let cart = HybridCart::new(guest_cart, server_cart, catalog.clone(), session.clone());
        let shipping = Arc::new(ShippingQuoteNegotiator::new(
            ShippingClient::new(http.clone(), &api_base, session.clone()),
            catalog.clone(),
        ));
        let orders = OrderClient::new(http, &api_base);
        let checkout = CheckoutSubmitter::new(
            session.clone(),
            cart.clone(),
            Arc::clone(&shipping),
            orders,
            &api_base,
        );

        Self {
            inner: Arc::new(SessionInner {
                config,
                session,
                catalog,
                cart,
                shipping,
                checkout,
                delivery: Mutex::new(None),
            }),
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// The session token coordinator.
    #[must_use]
    pub fn session(&self) -> &SessionCoordinator {
        &self.inner.session
    }

    /// Whether a valid session exists (non-intrusive check).
    pub async fn is_authenticated(&self) -> bool {
        self.inner.session.is_authenticated().await
    }

    /// Account profile, if a session can be established.
    ///
    /// # Errors
    ///
    /// `NoSession`/`InvalidToken` on authentication failure, `Network`
    /// on transport failure.
    pub async fn profile(&self) -> Result<Profile> {
        let token = self.inner.session.ensure_token().await?;
        self.inner.session.profile(&token).await
    }

    /// Close the session and clear all local state.
    ///
    /// # Errors
    ///
    /// `Storage` if local state cannot be cleared.
    pub async fn logout(&self) -> Result<()> {
        self.inner.session.logout().await
    }

    // =========================================================================
    // Catalog & cart
    // =========================================================================

    /// The public product catalog.
    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    /// The hybrid cart.
    #[must_use]
    pub fn cart(&self) -> &HybridCart {
        &self.inner.cart
    }

    /// Add a product to whichever cart applies. Mutating the cart makes
    /// any shipping quote stale, so the current set is invalidated.
    ///
    /// # Errors
    ///
    /// See [`HybridCart::add`].
    pub async fn add_to_cart(&self, product_id: ProductId, quantity: u32) -> Result<CartKind> {
        let kind = self.inner.cart.add(product_id, quantity).await?;
        self.inner.shipping.invalidate();
        Ok(kind)
    }

    /// Total item count for the header badge.
    ///
    /// # Errors
    ///
    /// See [`HybridCart::total_items`].
    pub async fn cart_badge_count(&self) -> Result<u32> {
        self.inner.cart.total_items().await
    }

    /// The cart view model: unified lines plus totals under the current
    /// delivery type and shipping selection.
    ///
    /// Shipping cost is zero for pickup, and zero for ship until a
    /// still-valid quote is selected - it is never assumed.
    ///
    /// # Errors
    ///
    /// See [`HybridCart::lines`].
    pub async fn cart_view(&self) -> Result<CartView> {
        let lines = self.inner.cart.lines().await?;
        let shipping_cost = match self.delivery_type() {
            Some(DeliveryType::Ship) => self
                .inner
                .shipping
                .cost_if_current(&lines)
                .unwrap_or(Pesos::ZERO),
            _ => Pesos::ZERO,
        };
        let totals = price_lines(&lines, shipping_cost);
        Ok(CartView { lines, totals })
    }

    // =========================================================================
    // Delivery & shipping
    // =========================================================================

    /// The currently selected delivery type, if any.
    #[must_use]
    pub fn delivery_type(&self) -> Option<DeliveryType> {
        *self
            .inner
            .delivery
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Record the delivery-type selection. Switching to pickup forces
    /// the shipping cost to zero and discards any quote state.
    pub fn set_delivery_type(&self, delivery: DeliveryType) {
        *self
            .inner
            .delivery
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(delivery);
        if delivery == DeliveryType::Pickup {
            debug!("pickup selected, discarding shipping quotes");
            self.inner.shipping.invalidate();
        }
    }

    /// The shipping quote negotiator.
    #[must_use]
    pub fn shipping(&self) -> &ShippingQuoteNegotiator {
        &self.inner.shipping
    }

    /// Request carrier quotes for the current cart.
    ///
    /// # Errors
    ///
    /// See [`ShippingQuoteNegotiator::request_quotes`].
    pub async fn request_shipping_quotes(
        &self,
        destination: Destination,
    ) -> Result<Vec<ShippingQuote>> {
        let lines = self.inner.cart.lines().await?;
        self.inner.shipping.request_quotes(destination, &lines).await
    }

    /// Switch the selected shipping option, returning the option and the
    /// recomputed totals.
    ///
    /// # Errors
    ///
    /// See [`ShippingQuoteNegotiator::select`].
    pub fn select_shipping_option(&self, index: usize) -> Result<(ShippingQuote, Totals)> {
        self.inner.shipping.select(index)
    }

    /// Carrier coverage regions for address pickers.
    ///
    /// # Errors
    ///
    /// See [`ShippingClient::regions`].
    pub async fn shipping_regions(&self) -> Result<Vec<Region>> {
        self.inner.shipping.carrier().regions().await
    }

    /// Carrier coverage counties for a region.
    ///
    /// # Errors
    ///
    /// See [`ShippingClient::counties`].
    pub async fn shipping_counties(&self, region_id: &str) -> Result<Vec<County>> {
        self.inner.shipping.carrier().counties(region_id).await
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Where the current checkout attempt stands.
    #[must_use]
    pub fn checkout_state(&self) -> CheckoutState {
        self.inner.checkout.state()
    }

    /// Validate and submit an order.
    ///
    /// # Errors
    ///
    /// See [`CheckoutSubmitter::submit`].
    pub async fn checkout(&self, form: &CheckoutForm) -> Result<CheckoutOutcome> {
        self.inner.checkout.submit(form).await
    }

    /// The configuration this session was built from.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }
}
