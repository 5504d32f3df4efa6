//! Order submission client.
//!
//! One POST per checkout attempt. The draft is assembled entirely by the
//! checkout submitter; this client only ships it and maps the outcome.
//! There is no automatic retry: a failed submission leaves the cart and
//! all client state untouched, and the server's message is surfaced
//! verbatim.

use std::sync::Arc;

use serde::Deserialize;
use tracing::instrument;

use autonorte_core::OrderId;

use crate::checkout::OrderDraft;
use crate::error::Result;

#[derive(Debug, Deserialize)]
struct OrderResponse {
    order_id: OrderId,
}

/// Client for the order submission endpoint.
#[derive(Clone)]
pub struct OrderClient {
    inner: Arc<OrderInner>,
}

struct OrderInner {
    http: reqwest::Client,
    api_base: String,
}

impl OrderClient {
    /// Create a new order client.
    #[must_use]
    pub fn new(http: reqwest::Client, api_base: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(OrderInner {
                http,
                api_base: api_base.into(),
            }),
        }
    }

    /// Submit an order draft once.
    ///
    /// # Errors
    ///
    /// `InvalidToken` on 401/403, `ServerRejected` with the backend's
    /// message on any other non-2xx, `Network` on transport failure.
    #[instrument(skip(self, token, draft))]
    pub async fn submit(&self, token: &str, draft: &OrderDraft) -> Result<OrderId> {
        let url = format!("{}/api/orders/", self.inner.api_base);
        let response = self
            .inner
            .http
            .post(&url)
            .header("Authorization", format!("Token {token}"))
            .json(draft)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(super::rejection(response).await);
        }

        let body: OrderResponse = super::parse_json(response).await?;
        Ok(body.order_id)
    }
}
