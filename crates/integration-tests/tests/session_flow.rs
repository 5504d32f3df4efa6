//! Session recovery flows: validation failure, exchange, redirect-once.

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use autonorte_client::StoreError;
use autonorte_client::storage::CredentialStore;
use autonorte_integration_tests::TestStore;

#[tokio::test]
async fn test_rejected_token_recovers_through_one_exchange() {
    let ctx = TestStore::start().await;
    ctx.store.set_token("tok-stale").unwrap();

    Mock::given(method("GET"))
        .and(path("/api/profile/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&ctx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/login/from-session/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": "tok-fresh"})),
        )
        .expect(1)
        .mount(&ctx.server)
        .await;

    let token = ctx.session.session().ensure_token().await.unwrap();
    assert_eq!(token, "tok-fresh");
    assert_eq!(ctx.store.token().unwrap().as_deref(), Some("tok-fresh"));
    // Recovery succeeded, so no navigation happened.
    assert_eq!(ctx.redirect_count(), 0);
}

#[tokio::test]
async fn test_failed_validation_and_exchange_redirects_exactly_once() {
    let ctx = TestStore::start().await;
    ctx.store.set_token("tok-dead").unwrap();

    Mock::given(method("GET"))
        .and(path("/api/profile/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&ctx.server)
        .await;
    // The exchange is slow and failing; concurrent callers must not
    // issue a second one.
    Mock::given(method("GET"))
        .and(path("/api/login/from-session/"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(50)))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let coordinator = ctx.session.session();
    let (first, second) = tokio::join!(coordinator.ensure_token(), coordinator.ensure_token());
    assert!(first.is_err());
    assert!(second.is_err());

    // Exactly one exchange request (the expect(1) above) and exactly
    // one redirect despite two failing callers.
    assert_eq!(ctx.redirect_count(), 1);
    // The dead token was cleared.
    assert_eq!(ctx.store.token().unwrap(), None);
}

#[tokio::test]
async fn test_later_failures_never_navigate_again() {
    let ctx = TestStore::start().await;
    ctx.mount_exchange_failure().await;

    let coordinator = ctx.session.session();
    for _ in 0..3 {
        let err = coordinator.ensure_token().await.unwrap_err();
        assert!(matches!(err, StoreError::NoSession));
    }
    assert_eq!(ctx.redirect_count(), 1);
}

#[tokio::test]
async fn test_anonymous_browsing_never_triggers_redirect() {
    let ctx = TestStore::start().await;
    ctx.mount_product(5, "Filtro de aceite", 1190).await;

    // Guest adds and views the cart without any session.
    ctx.session.cart().guest().add(5.into(), 2).unwrap();
    let view = ctx.session.cart_view().await.unwrap();

    assert_eq!(view.lines.len(), 1);
    assert_eq!(view.totals.grand_total.amount(), 2380);
    assert!(!ctx.session.is_authenticated().await);
    assert_eq!(ctx.redirect_count(), 0);
}
