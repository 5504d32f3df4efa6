//! HTTP clients for the storefront backend.
//!
//! One small client per API surface, all sharing the same `reqwest`
//! client and error mapping:
//! - [`products`] - public catalog lookups (cached)
//! - [`cart`] - the authenticated server cart
//! - [`shipping`] - carrier coverage and quote requests
//! - [`orders`] - order submission
//!
//! Response bodies are read as text first and parsed with `serde_json`
//! so parse failures can be logged with a body snippet.

pub mod cart;
pub mod orders;
pub mod products;
pub mod shipping;

pub use cart::{CartClient, ServerCartLine};
pub use orders::OrderClient;
pub use products::{CatalogClient, Product};
pub use shipping::{County, Destination, Manifest, Region, ShippingClient, ShippingQuote};

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::StoreError;

/// Map a non-success response to the matching error variant, consuming
/// the body. `401`/`403` become `InvalidToken`; everything else is
/// `ServerRejected` with the server's message verbatim.
pub(crate) async fn rejection(response: reqwest::Response) -> StoreError {
    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return StoreError::InvalidToken;
    }
    let body = response.text().await.unwrap_or_default();
    StoreError::ServerRejected {
        status: status.as_u16(),
        message: extract_error_message(&body),
    }
}

/// Backends wrap failures as `{"error": "..."}`; fall back to a raw
/// body snippet when they don't.
fn extract_error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: String,
    }

    serde_json::from_str::<ErrorBody>(body).map_or_else(
        |_| body.chars().take(200).collect::<String>(),
        |parsed| parsed.error,
    )
}

/// Parse a success response body, logging a snippet when the shape is
/// unexpected.
pub(crate) async fn parse_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, StoreError> {
    let body = response.text().await?;
    match serde_json::from_str(&body) {
        Ok(value) => Ok(value),
        Err(err) => {
            tracing::error!(
                error = %err,
                body = %body.chars().take(500).collect::<String>(),
                "failed to parse API response"
            );
            Err(StoreError::Parse(err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_error_message_from_envelope() {
        assert_eq!(
            extract_error_message(r#"{"error": "Stock insuficiente"}"#),
            "Stock insuficiente"
        );
    }

    #[test]
    fn test_extract_error_message_raw_fallback() {
        assert_eq!(extract_error_message("gateway timeout"), "gateway timeout");
    }
}
