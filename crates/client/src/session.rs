//! Session token coordination.
//!
//! The coordinator owns the stored token's lifecycle: it exchanges an
//! existing server session (cookie) for a token, validates tokens
//! against the profile endpoint, and decides when the embedding page
//! must navigate to login.
//!
//! Two latches guard the failure paths:
//! - **single-flight**: at most one session-to-token exchange request is
//!   ever outstanding; a caller arriving while one is in flight gets
//!   `NoSession` immediately instead of issuing a duplicate.
//! - **redirect-once**: the login redirect hook fires at most once per
//!   coordinator lifetime, no matter how many failures follow. A fresh
//!   page session constructs a fresh coordinator, which resets it.
//!
//! Both latches are explicit atomic fields, released on every exit path.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::error::{Result, StoreError};
use crate::storage::CredentialStore;

/// Hook invoked (at most once) when the client needs the page to
/// navigate to the login screen.
pub type RedirectHook = Box<dyn Fn() + Send + Sync>;

/// Minimal account profile returned by the validation endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    /// Account username.
    pub username: String,
    /// Account email, used for the order draft.
    pub email: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

/// Coordinates acquisition, validation and disposal of the session token.
#[derive(Clone)]
pub struct SessionCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    http: reqwest::Client,
    api_base: String,
    store: Arc<dyn CredentialStore>,
    exchange_in_flight: AtomicBool,
    redirect_issued: AtomicBool,
    on_redirect: Option<RedirectHook>,
}

/// Releases the single-flight latch on every exit path.
struct ExchangeGuard<'a>(&'a AtomicBool);

impl Drop for ExchangeGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// A stored token is only worth validating if it is non-empty and not
/// one of the literal junk markers older clients persisted.
fn usable_token(raw: Option<String>) -> Option<String> {
    let token = raw?;
    let trimmed = token.trim();
    if trimmed.is_empty() || trimmed == "undefined" || trimmed == "null" {
        return None;
    }
    Some(token)
}

impl SessionCoordinator {
    /// Create a coordinator over the given HTTP client and store.
    ///
    /// `on_redirect` is the navigation sink fired (once) when
    /// authentication cannot be recovered.
    pub fn new(
        http: reqwest::Client,
        api_base: impl Into<String>,
        store: Arc<dyn CredentialStore>,
        on_redirect: Option<RedirectHook>,
    ) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                http,
                api_base: api_base.into(),
                store,
                exchange_in_flight: AtomicBool::new(false),
                redirect_issued: AtomicBool::new(false),
                on_redirect,
            }),
        }
    }

    /// Return a validated token, exchanging the server session if needed.
    ///
    /// Algorithm: read the stored token; if absent or malformed, attempt
    /// the session exchange. If present, validate it remotely; on
    /// validation failure attempt the exchange once. An exchange failure
    /// clears the stored token and fires the redirect hook.
    ///
    /// # Errors
    ///
    /// `NoSession` if no token could be obtained (including when another
    /// exchange is already in flight), `Network` on transport failure
    /// during the exchange.
    #[instrument(skip(self))]
    pub async fn ensure_token(&self) -> Result<String> {
        match usable_token(self.inner.store.token()?) {
            None => {
                debug!("no stored token, attempting session exchange");
                self.exchange_from_session().await
            }
            Some(token) => {
                if self.validate(&token).await {
                    Ok(token)
                } else {
                    debug!("stored token failed validation, attempting session exchange");
                    self.exchange_from_session().await
                }
            }
        }
    }

    /// Whether a valid session exists. Never exchanges, never redirects.
    pub async fn is_authenticated(&self) -> bool {
        self.token_if_available().await.is_some()
    }

    /// Return the stored token if it is present and validates remotely.
    /// Never exchanges, never redirects - safe for pages that tolerate
    /// anonymous visitors.
    pub async fn token_if_available(&self) -> Option<String> {
        let token = match self.inner.store.token() {
            Ok(raw) => usable_token(raw)?,
            Err(err) => {
                warn!(%err, "credential store read failed");
                return None;
            }
        };
        if self.validate(&token).await {
            Some(token)
        } else {
            None
        }
    }

    /// Fetch the account profile for a validated token.
    ///
    /// On a 401/403 the stored token is cleared and the redirect hook is
    /// fired, matching the page behavior this replaces.
    ///
    /// # Errors
    ///
    /// `InvalidToken` if the backend rejects the token, `Network` on
    /// transport failure.
    #[instrument(skip_all)]
    pub async fn profile(&self, token: &str) -> Result<Profile> {
        let url = format!("{}/api/profile/", self.inner.api_base);
        let response = self
            .inner
            .http
            .get(&url)
            .header("Authorization", format!("Token {token}"))
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "profile fetch rejected");
            self.inner.store.clear_token()?;
            self.request_login_redirect();
            return Err(StoreError::InvalidToken);
        }

        let body = response.text().await?;
        let profile: Profile = serde_json::from_str(&body)?;
        Ok(profile)
    }

    /// Close the session: best-effort server-side logout, then clear all
    /// local state (token and guest cart).
    ///
    /// # Errors
    ///
    /// `Storage` if local state could not be cleared. Server-side logout
    /// failures are logged and ignored.
    pub async fn logout(&self) -> Result<()> {
        let url = format!("{}/logout/", self.inner.api_base);
        if let Err(err) = self.inner.http.get(&url).send().await {
            warn!(%err, "server-side logout failed, clearing local state anyway");
        }
        self.inner.store.clear_all()?;
        Ok(())
    }

    /// Whether the redirect-once latch has fired.
    #[must_use]
    pub fn redirect_issued(&self) -> bool {
        self.inner.redirect_issued.load(Ordering::SeqCst)
    }

    /// Validate a token against the profile endpoint.
    ///
    /// Transport failures count as "not valid": the caller falls back to
    /// the exchange path, which is where network errors get surfaced.
    async fn validate(&self, token: &str) -> bool {
        let url = format!("{}/api/profile/", self.inner.api_base);
        let result = self
            .inner
            .http
            .get(&url)
            .header("Authorization", format!("Token {token}"))
            .send()
            .await;
        match result {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                warn!(%err, "token validation request failed");
                false
            }
        }
    }

    /// Exchange the server session cookie for a fresh token.
    ///
    /// Single-flight: if an exchange is already outstanding, returns
    /// `NoSession` immediately without issuing a request and without
    /// touching the redirect latch.
    async fn exchange_from_session(&self) -> Result<String> {
        if self.inner.exchange_in_flight.swap(true, Ordering::SeqCst) {
            debug!("token exchange already in flight, refusing duplicate");
            return Err(StoreError::NoSession);
        }
        let _guard = ExchangeGuard(&self.inner.exchange_in_flight);

        match self.request_exchange().await {
            Ok(token) => {
                self.inner.store.set_token(&token)?;
                debug!("token obtained from server session");
                Ok(token)
            }
            Err(err) => {
                warn!(%err, "session exchange failed");
                self.inner.store.clear_token()?;
                self.request_login_redirect();
                Err(err)
            }
        }
    }

    async fn request_exchange(&self) -> Result<String> {
        let url = format!("{}/api/login/from-session/", self.inner.api_base);
        let response = self.inner.http.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(StoreError::NoSession);
        }

        let body = response.text().await?;
        let parsed: TokenResponse = serde_json::from_str(&body)?;
        usable_token(Some(parsed.token)).ok_or(StoreError::NoSession)
    }

    /// Fire the login redirect hook, at most once per coordinator.
    fn request_login_redirect(&self) {
        if self.inner.redirect_issued.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!("requesting login redirect");
        if let Some(hook) = &self.inner.on_redirect {
            hook();
        }
    }
}
