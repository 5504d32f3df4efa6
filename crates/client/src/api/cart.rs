//! Authenticated server cart proxy.
//!
//! Thin request wrapper over the cart API. Every call obtains a token
//! through the session coordinator first; a `401`/`403` on the request
//! itself is surfaced as `InvalidToken` and never retried here - the
//! next `ensure_token` call owns recovery.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{instrument, warn};

use autonorte_core::{Pesos, ProductId};

use crate::error::{Result, StoreError};
use crate::session::SessionCoordinator;

/// One line of the server-side cart, as the backend returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerCartLine {
    pub product_id: ProductId,
    /// Product display name.
    pub product: String,
    /// Unit price, IVA included.
    pub price: Pesos,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
struct CartResponse {
    cart: Vec<ServerCartLine>,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u32,
}

/// Client for the authenticated cart API.
#[derive(Clone)]
pub struct CartClient {
    inner: Arc<CartInner>,
}

struct CartInner {
    http: reqwest::Client,
    api_base: String,
    session: SessionCoordinator,
}

impl CartClient {
    /// Create a new cart client delegating token acquisition to the
    /// given coordinator.
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        api_base: impl Into<String>,
        session: SessionCoordinator,
    ) -> Self {
        Self {
            inner: Arc::new(CartInner {
                http,
                api_base: api_base.into(),
                session,
            }),
        }
    }

    /// Fetch the full server cart.
    ///
    /// # Errors
    ///
    /// `NoSession`/`InvalidToken` on authentication failure, `Network`
    /// or `ServerRejected` otherwise.
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> Result<Vec<ServerCartLine>> {
        let token = self.inner.session.ensure_token().await?;
        let url = format!("{}/api/cart/", self.inner.api_base);
        let response = self.authorized_get(&url, &token).await?;
        let body: CartResponse = super::parse_json(response).await?;
        Ok(body.cart)
    }

    /// Add `quantity` units of a product to the cart.
    ///
    /// # Errors
    ///
    /// See [`Self::fetch`].
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_item(&self, product_id: ProductId, quantity: u32) -> Result<()> {
        let token = self.inner.session.ensure_token().await?;
        let url = format!("{}/api/cart/add/{product_id}/", self.inner.api_base);
        let response = self
            .inner
            .http
            .post(&url)
            .header("Authorization", format!("Token {token}"))
            .json(&serde_json::json!({ "quantity": quantity }))
            .send()
            .await?;
        ack(response).await
    }

    /// Adjust a line's quantity by `delta`.
    ///
    /// The backend adjusts one unit per request, so this issues `|delta|`
    /// sequential calls to the increase or decrease endpoint and stops at
    /// the first failure (leaving server state exactly as the completed
    /// calls made it).
    ///
    /// # Errors
    ///
    /// See [`Self::fetch`].
    #[instrument(skip(self), fields(product_id = %product_id, delta))]
    pub async fn adjust_quantity(&self, product_id: ProductId, delta: i32) -> Result<()> {
        if delta == 0 {
            return Ok(());
        }
        let endpoint = if delta > 0 { "increase" } else { "decrease" };
        for _ in 0..delta.unsigned_abs() {
            let token = self.inner.session.ensure_token().await?;
            let url = format!(
                "{}/api/cart/{endpoint}/{product_id}/",
                self.inner.api_base
            );
            let response = self
                .inner
                .http
                .post(&url)
                .header("Authorization", format!("Token {token}"))
                .send()
                .await?;
            ack(response).await?;
        }
        Ok(())
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// See [`Self::fetch`].
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_item(&self, product_id: ProductId) -> Result<()> {
        let token = self.inner.session.ensure_token().await?;
        let url = format!("{}/api/cart/remove/{product_id}/", self.inner.api_base);
        let response = self
            .inner
            .http
            .post(&url)
            .header("Authorization", format!("Token {token}"))
            .send()
            .await?;
        ack(response).await
    }

    /// Empty the cart.
    ///
    /// Falls back to removing lines one by one when the bulk endpoint is
    /// not deployed (404), so older backends still end up empty.
    ///
    /// # Errors
    ///
    /// See [`Self::fetch`].
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<()> {
        let token = self.inner.session.ensure_token().await?;
        let url = format!("{}/api/cart/clear/", self.inner.api_base);
        let response = self
            .inner
            .http
            .post(&url)
            .header("Authorization", format!("Token {token}"))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            warn!("bulk clear endpoint missing, removing lines individually");
            for line in self.fetch().await? {
                self.remove_item(line.product_id).await?;
            }
            return Ok(());
        }
        ack(response).await
    }

    /// Total item count in the server cart (header badge).
    ///
    /// # Errors
    ///
    /// See [`Self::fetch`].
    pub async fn count(&self) -> Result<u32> {
        let token = self.inner.session.ensure_token().await?;
        let url = format!("{}/api/cart/count/", self.inner.api_base);
        let response = self.authorized_get(&url, &token).await?;
        let body: CountResponse = super::parse_json(response).await?;
        Ok(body.count)
    }

    async fn authorized_get(&self, url: &str, token: &str) -> Result<reqwest::Response> {
        let response = self
            .inner
            .http
            .get(url)
            .header("Authorization", format!("Token {token}"))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(super::rejection(response).await);
        }
        Ok(response)
    }
}

/// Discard the `{ ok }` body of a successful mutation; map failures.
async fn ack(response: reqwest::Response) -> Result<()> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(super::rejection(response).await)
    }
}
