//! End-to-end checkout: gating, quoting, submission, failure handling.

use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use autonorte_client::StoreError;
use autonorte_client::api::Destination;
use autonorte_client::checkout::{CheckoutForm, CheckoutState, ValidationError};
use autonorte_core::{DeliveryType, PaymentMethod, Pesos};
use autonorte_integration_tests::TestStore;

fn ship_form() -> CheckoutForm {
    CheckoutForm {
        payment_method: Some(PaymentMethod::Card),
        delivery_type: Some(DeliveryType::Ship),
        street: "Av. Matta 845".to_string(),
        comuna: "13101".to_string(),
        region: "R13".to_string(),
    }
}

fn santiago() -> Destination {
    Destination {
        region: "R13".to_string(),
        comuna: "13101".to_string(),
        address: "Av. Matta 845".to_string(),
    }
}

/// Authenticated session with a two-line server cart (gross 4760).
async fn checkout_context() -> TestStore {
    let ctx = TestStore::start().await;
    ctx.login("tok-1").await;
    ctx.mount_server_cart(serde_json::json!([
        {"product_id": 5, "product": "Filtro de aceite", "price": 1190, "quantity": 2},
        {"product_id": 7, "product": "Bujía NGK", "price": 2380, "quantity": 1},
    ]))
    .await;
    ctx.mount_product(5, "Filtro de aceite", 1190).await;
    ctx.mount_product(7, "Bujía NGK", 2380).await;
    ctx
}

#[tokio::test]
async fn test_ship_without_quote_is_refused_before_any_order_request() {
    let ctx = checkout_context().await;
    Mock::given(method("POST"))
        .and(path("/api/orders/"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&ctx.server)
        .await;

    ctx.session.set_delivery_type(DeliveryType::Ship);
    let err = ctx.session.checkout(&ship_form()).await.unwrap_err();

    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::ShippingNotCalculated)
    ));
    assert_eq!(ctx.session.checkout_state(), CheckoutState::Idle);
}

#[tokio::test]
async fn test_full_ship_checkout_includes_selected_quote() {
    let ctx = checkout_context().await;
    ctx.mount_quotes(serde_json::json!([
        {"name": "Express", "cost": 5200, "eta": "1 día hábil"},
        {"name": "Económico", "cost": 3000, "eta": "3 a 5 días hábiles"},
    ]))
    .await;
    Mock::given(method("POST"))
        .and(path("/api/orders/"))
        .and(body_partial_json(serde_json::json!({
            "email": "pcastro@example.com",
            "total_amount": 7760,
            "payment_method": "card",
            "delivery_type": "ship",
            "address": {"street": "Av. Matta 845", "comuna": "13101", "region": "R13"},
            "shipping": {"service": "Económico", "cost": 3000},
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({"order_id": 1007})),
        )
        .expect(1)
        .mount(&ctx.server)
        .await;

    ctx.session.set_delivery_type(DeliveryType::Ship);
    let quotes = ctx.session.request_shipping_quotes(santiago()).await.unwrap();
    assert_eq!(quotes.len(), 2);

    // Pick the cheaper option; totals update with the selection.
    let (_, totals) = ctx.session.select_shipping_option(1).unwrap();
    assert_eq!(totals.grand_total, Pesos::new(7760));

    let outcome = ctx.session.checkout(&ship_form()).await.unwrap();
    assert_eq!(outcome.order_id.as_i32(), 1007);
    assert!(outcome.payment_url.ends_with("/pay/1007/"));
    assert_eq!(ctx.session.checkout_state(), CheckoutState::Redirecting);

    // The cart is deliberately left intact until payment confirms.
    let requests = ctx.server.received_requests().await.unwrap();
    assert!(
        !requests
            .iter()
            .any(|request| request.url.path().contains("/api/cart/clear/")
                || request.url.path().contains("/api/cart/remove/")),
        "checkout must not clear the cart"
    );
}

#[tokio::test]
async fn test_switching_to_pickup_drops_shipping_cost() {
    let ctx = checkout_context().await;
    ctx.mount_quotes(serde_json::json!([
        {"name": "Económico", "cost": 3000, "eta": "3 a 5 días hábiles"},
    ]))
    .await;

    ctx.session.set_delivery_type(DeliveryType::Ship);
    ctx.session.request_shipping_quotes(santiago()).await.unwrap();
    let with_shipping = ctx.session.cart_view().await.unwrap();
    assert_eq!(with_shipping.totals.grand_total, Pesos::new(7760));

    // Pickup discards the quote state and the cost, nothing else.
    ctx.session.set_delivery_type(DeliveryType::Pickup);
    let pickup = ctx.session.cart_view().await.unwrap();
    assert_eq!(pickup.totals.grand_total, Pesos::new(4760));
    assert_eq!(pickup.totals.shipping, Pesos::ZERO);
    assert!(ctx.session.shipping().selected_quote().is_none());
}

#[tokio::test]
async fn test_stale_quote_is_refused_at_checkout() {
    let ctx = checkout_context().await;
    ctx.mount_quotes(serde_json::json!([
        {"name": "Económico", "cost": 3000, "eta": "3 a 5 días hábiles"},
    ]))
    .await;

    ctx.session.set_delivery_type(DeliveryType::Ship);
    ctx.session.request_shipping_quotes(santiago()).await.unwrap();

    // The cart changes after the quote was priced.
    ctx.server.reset().await;
    ctx.mount_profile_ok().await;
    ctx.mount_server_cart(serde_json::json!([
        {"product_id": 5, "product": "Filtro de aceite", "price": 1190, "quantity": 5},
    ]))
    .await;
    Mock::given(method("POST"))
        .and(path("/api/orders/"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&ctx.server)
        .await;

    let err = ctx.session.checkout(&ship_form()).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::ShippingQuoteStale)
    ));
    assert_eq!(ctx.session.checkout_state(), CheckoutState::Idle);
}

#[tokio::test]
async fn test_server_rejection_surfaces_message_and_fails() {
    let ctx = checkout_context().await;
    Mock::given(method("POST"))
        .and(path("/api/orders/"))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "error": "Stock insuficiente para Filtro de aceite"
        })))
        .expect(1)
        .mount(&ctx.server)
        .await;

    ctx.session.set_delivery_type(DeliveryType::Pickup);
    let form = CheckoutForm {
        payment_method: Some(PaymentMethod::Transfer),
        delivery_type: Some(DeliveryType::Pickup),
        ..CheckoutForm::default()
    };

    let err = ctx.session.checkout(&form).await.unwrap_err();
    match err {
        StoreError::ServerRejected { status, message } => {
            assert_eq!(status, 409);
            assert_eq!(message, "Stock insuficiente para Filtro de aceite");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(ctx.session.checkout_state(), CheckoutState::Failed);

    // A failed submission never clears the cart.
    let view = ctx.session.cart_view().await.unwrap();
    assert_eq!(view.lines.len(), 2);
}
