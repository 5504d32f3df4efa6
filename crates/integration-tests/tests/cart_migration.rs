//! Guest-cart migration into the server cart.

use autonorte_client::cart::MigrationOutcome;
use autonorte_core::ProductId;
use autonorte_integration_tests::TestStore;

#[tokio::test]
async fn test_guest_cart_drains_into_server_cart_in_order() {
    let ctx = TestStore::start().await;

    // Guest shopping before login.
    ctx.session.cart().guest().add(5.into(), 2).unwrap();
    ctx.session.cart().guest().add(7.into(), 1).unwrap();

    // Then a session appears.
    ctx.login("tok-1").await;
    ctx.mount_cart_add_ok(5).await;
    ctx.mount_cart_add_ok(7).await;
    ctx.mount_server_cart(serde_json::json!([
        {"product_id": 5, "product": "Filtro de aceite", "price": 1190, "quantity": 2},
        {"product_id": 7, "product": "Bujía NGK", "price": 2380, "quantity": 1},
    ]))
    .await;

    // First authenticated cart view triggers the one-shot migration.
    let lines = ctx.session.cart().lines().await.unwrap();
    let total_items: u32 = lines.iter().map(|line| line.quantity).sum();
    assert_eq!(total_items, 3);

    // Guest cart is discarded after a complete migration.
    assert!(ctx.session.cart().guest().is_empty().unwrap());

    // Adds were issued sequentially in insertion order.
    let adds: Vec<String> = ctx
        .server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.url.path().starts_with("/api/cart/add/"))
        .map(|request| request.url.path().to_string())
        .collect();
    assert_eq!(adds, vec!["/api/cart/add/5/", "/api/cart/add/7/"]);
}

#[tokio::test]
async fn test_partial_migration_retains_only_failed_entries() {
    let ctx = TestStore::start().await;

    ctx.session.cart().guest().add(5.into(), 2).unwrap();
    ctx.session.cart().guest().add(7.into(), 1).unwrap();

    ctx.login("tok-1").await;
    ctx.mount_cart_add_ok(5).await;
    ctx.mount_cart_add_failure(7, 409, "Stock insuficiente").await;

    let outcome = ctx.session.cart().migrate_guest_cart().await.unwrap();
    assert_eq!(
        outcome,
        MigrationOutcome::Partial {
            migrated: 2,
            retained: 1,
        }
    );

    // Only the failed entry survives, ready for a later retry.
    let entries = ctx.session.cart().guest().entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries.get(&ProductId::new(7)).copied(), Some(1));
}

#[tokio::test]
async fn test_migration_without_session_leaves_guest_cart_untouched() {
    let ctx = TestStore::start().await;

    ctx.session.cart().guest().add(5.into(), 2).unwrap();

    let outcome = ctx.session.cart().migrate_guest_cart().await.unwrap();
    assert_eq!(outcome, MigrationOutcome::SkippedAnonymous);
    assert_eq!(ctx.session.cart().guest().total_items().unwrap(), 2);
}

#[tokio::test]
async fn test_empty_guest_cart_migration_is_a_noop() {
    let ctx = TestStore::start().await;
    ctx.login("tok-1").await;

    let outcome = ctx.session.cart().migrate_guest_cart().await.unwrap();
    assert_eq!(outcome, MigrationOutcome::Nothing);
}
