//! Unified error handling for the storefront client.
//!
//! Provides the `StoreError` taxonomy shared by every component. All
//! public client operations return `Result<T, StoreError>`.
//!
//! Authentication failures (`NoSession`, `InvalidToken`) are recovered
//! locally by the session coordinator up to one exchange attempt and then
//! surfaced through the redirect hook; callers still see the typed
//! variant so flows can be logged and tested. Cart, shipping and order
//! failures are plain typed results - presentation is the embedding
//! page's concern.

use thiserror::Error;

use crate::checkout::ValidationError;

/// Errors that can occur in the storefront client core.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No session token could be obtained (not logged in, or the
    /// session-to-token exchange failed or was already in flight).
    #[error("no session available")]
    NoSession,

    /// A token was presented and the backend rejected it (401/403).
    #[error("session token rejected by the backend")]
    InvalidToken,

    /// Transport-level failure (connection, timeout, malformed transfer).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body did not match the expected shape.
    #[error("malformed response: {0}")]
    Parse(#[from] serde_json::Error),

    /// The carrier has no shipping options for the destination.
    #[error("no shipping coverage: {0}")]
    NoCoverage(String),

    /// Checkout form validation failed; no request was issued.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The backend rejected a request with a 4xx/5xx and a message,
    /// surfaced verbatim.
    #[error("rejected by server ({status}): {message}")]
    ServerRejected {
        /// HTTP status code of the rejection.
        status: u16,
        /// Server-provided error message, verbatim.
        message: String,
    },

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Credential store I/O failed.
    #[error("credential storage error: {0}")]
    Storage(#[from] std::io::Error),
}

/// Result type alias for `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::NoSession;
        assert_eq!(err.to_string(), "no session available");

        let err = StoreError::ServerRejected {
            status: 409,
            message: "stock insuficiente".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "rejected by server (409): stock insuficiente"
        );
    }

    #[test]
    fn test_validation_error_converts() {
        let err: StoreError = ValidationError::MissingPaymentMethod.into();
        assert!(matches!(err, StoreError::Validation(_)));
    }
}
