//! Cross-component scenario tests for the AutoNorte storefront client.
//!
//! Unit tests inside `autonorte-client` cover each component against a
//! mock backend; the tests in this crate drive whole flows through
//! [`StorefrontSession`]: login recovery, guest-cart migration, quote
//! invalidation and checkout.
//!
//! The harness stands up one `wiremock` server per test and wires a
//! session with an in-memory credential store and a counting redirect
//! hook.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use autonorte_client::session::RedirectHook;
use autonorte_client::storage::{CredentialStore, MemoryStore};
use autonorte_client::{StoreConfig, StorefrontSession};

/// One mocked backend plus a session wired to it.
pub struct TestStore {
    pub server: MockServer,
    pub store: Arc<MemoryStore>,
    pub session: StorefrontSession,
    redirects: Arc<AtomicUsize>,
}

impl TestStore {
    /// Start a mock backend and a fresh session against it.
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());
        let redirects = Arc::new(AtomicUsize::new(0));

        let hook: RedirectHook = {
            let redirects = Arc::clone(&redirects);
            Box::new(move || {
                redirects.fetch_add(1, Ordering::SeqCst);
            })
        };

        let dyn_store: Arc<dyn CredentialStore> = store.clone();
        let session = StorefrontSession::with_store(
            StoreConfig::new(server.uri()),
            reqwest::Client::new(),
            dyn_store,
            Some(hook),
        );

        Self {
            server,
            store,
            session,
            redirects,
        }
    }

    /// How many times the login-redirect hook has fired.
    pub fn redirect_count(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }

    /// Store a token and mount a profile route that accepts it.
    pub async fn login(&self, token: &str) {
        self.store.set_token(token).unwrap();
        self.mount_profile_ok().await;
    }

    /// Mount a 200 profile response.
    pub async fn mount_profile_ok(&self) {
        Mock::given(method("GET"))
            .and(path("/api/profile/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "username": "pcastro",
                "email": "pcastro@example.com",
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount a 401 profile response (token rejected).
    pub async fn mount_profile_unauthorized(&self) {
        Mock::given(method("GET"))
            .and(path("/api/profile/"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&self.server)
            .await;
    }

    /// Mount a successful session-to-token exchange.
    pub async fn mount_exchange(&self, token: &str) {
        Mock::given(method("GET"))
            .and(path("/api/login/from-session/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "token": token })),
            )
            .mount(&self.server)
            .await;
    }

    /// Mount a failing session-to-token exchange.
    pub async fn mount_exchange_failure(&self) {
        Mock::given(method("GET"))
            .and(path("/api/login/from-session/"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&self.server)
            .await;
    }

    /// Mount a public product.
    pub async fn mount_product(&self, id: i32, name: &str, price: i64) {
        Mock::given(method("GET"))
            .and(path(format!("/api/products/{id}/")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": id,
                "name": name,
                "price": price,
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount the server cart fetch with the given lines.
    pub async fn mount_server_cart(&self, lines: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/api/cart/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "cart": lines })),
            )
            .mount(&self.server)
            .await;
    }

    /// Mount a successful cart add for one product.
    pub async fn mount_cart_add_ok(&self, id: i32) {
        Mock::given(method("POST"))
            .and(path(format!("/api/cart/add/{id}/")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&self.server)
            .await;
    }

    /// Mount a failing cart add for one product.
    pub async fn mount_cart_add_failure(&self, id: i32, status: u16, message: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/api/cart/add/{id}/")))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_json(serde_json::json!({ "error": message })),
            )
            .mount(&self.server)
            .await;
    }

    /// Mount carrier quotes.
    pub async fn mount_quotes(&self, options: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/api/shipping/quote/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "options": options,
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount a successful order submission.
    pub async fn mount_order_created(&self, order_id: i32) {
        Mock::given(method("POST"))
            .and(path("/api/orders/"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(serde_json::json!({ "order_id": order_id })),
            )
            .mount(&self.server)
            .await;
    }
}
