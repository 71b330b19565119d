//! Order creation through the success page.
//!
//! Drives the real checkout machine and stores against a mock gateway:
//! the ordered ladder of steps, the preconditions that keep bad runs off
//! the network, and the fail-closed success page.

use rust_decimal::Decimal;
use tamarind_core::{AuthSession, OrderDetail, OrderId, PaymentId, Role};
use tamarind_integration_tests::mocks::{MockOrderGateway, cart_line};
use tamarind_storefront::api::CreatedOrder;
use tamarind_storefront::bus::EventBus;
use tamarind_storefront::checkout::{CheckoutError, CheckoutFlow, present_success};
use tamarind_storefront::stores::{AuthStore, CartStore};

fn gateway() -> MockOrderGateway {
    MockOrderGateway::new(
        CreatedOrder {
            order_id: OrderId::new("ORD123"),
            total: Decimal::new(49950, 2),
        },
        OrderDetail {
            order_id: OrderId::new("ORD123"),
            total_amount: Decimal::new(49950, 2),
            status: Some("processing".to_owned()),
            placed_at: None,
        },
    )
}

fn signed_in_stores() -> (AuthStore, CartStore) {
    let bus = EventBus::new();
    let auth = AuthStore::new(bus.clone());
    let cart = CartStore::new(bus);
    auth.login(AuthSession::new("tok", "Ada", Role::Customer));
    (auth, cart)
}

#[tokio::test]
async fn the_happy_path_reaches_the_success_view() {
    let gateway = gateway();
    let (auth, cart) = signed_in_stores();
    cart.add(cart_line("tee-1", 1950, 2));
    cart.add(cart_line("boot-7", 46050, 1));

    let mut flow = CheckoutFlow::new();
    let order_id = flow
        .create_order(&gateway, &cart, &auth)
        .await
        .expect("order should be created");
    assert_eq!(order_id.as_str(), "ORD123");
    assert_eq!(gateway.last_order_lines().len(), 2);

    flow.open_payment().expect("payment should open");
    flow.confirm_payment(PaymentId::new("PAY456"))
        .expect("payment should confirm");

    let handoff = flow.take_handoff().expect("handoff should be consumable");
    let view = present_success(&gateway, Some(handoff))
        .await
        .expect("success view should build");

    assert_eq!(view.order_number, "ORD123");
    assert_eq!(view.amount, "499.50");
    assert_eq!(view.payment_ref, "PAY456");
    assert_eq!(view.status.as_deref(), Some("processing"));
    assert_eq!(gateway.create_calls(), 1);
    assert_eq!(gateway.fetch_calls(), 1);

    // The handoff was consumed; the flow cannot serve another.
    assert!(matches!(
        flow.take_handoff(),
        Err(CheckoutError::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn preconditions_keep_bad_runs_off_the_network() {
    let gateway = gateway();
    let bus = EventBus::new();
    let auth = AuthStore::new(bus.clone());
    let cart = CartStore::new(bus);
    cart.add(cart_line("tee-1", 1950, 1));

    // Signed out: rejected before any backend call.
    let mut flow = CheckoutFlow::new();
    assert!(matches!(
        flow.create_order(&gateway, &cart, &auth).await,
        Err(CheckoutError::Unauthenticated)
    ));

    // Signed in but empty cart: likewise rejected.
    auth.login(AuthSession::new("tok", "Ada", Role::Customer));
    cart.clear();
    assert!(matches!(
        flow.create_order(&gateway, &cart, &auth).await,
        Err(CheckoutError::EmptyCart)
    ));

    assert_eq!(gateway.create_calls(), 0);

    // With both preconditions met the same flow proceeds.
    cart.add(cart_line("tee-1", 1950, 1));
    assert!(flow.create_order(&gateway, &cart, &auth).await.is_ok());
    assert_eq!(gateway.create_calls(), 1);
}

#[tokio::test]
async fn steps_out_of_order_are_rejected_without_side_effects() {
    let gateway = gateway();
    let (auth, cart) = signed_in_stores();
    cart.add(cart_line("tee-1", 1950, 1));

    let mut flow = CheckoutFlow::new();

    // No order yet: neither payment nor handoff may proceed.
    assert!(matches!(
        flow.confirm_payment(PaymentId::new("PAY456")),
        Err(CheckoutError::InvalidTransition { .. })
    ));
    assert!(matches!(
        flow.take_handoff(),
        Err(CheckoutError::InvalidTransition { .. })
    ));

    flow.create_order(&gateway, &cart, &auth)
        .await
        .expect("order should be created");

    // Payment must be opened before it can be confirmed.
    assert!(matches!(
        flow.confirm_payment(PaymentId::new("PAY456")),
        Err(CheckoutError::InvalidTransition { .. })
    ));

    // The rejected steps must not have reached the gateway again.
    assert_eq!(gateway.create_calls(), 1);
    assert_eq!(gateway.fetch_calls(), 0);
}

#[tokio::test]
async fn the_success_page_without_a_handoff_fails_closed() {
    let gateway = gateway();

    let error = present_success(&gateway, None)
        .await
        .expect_err("no handoff must not render a success view");

    assert!(matches!(error, CheckoutError::MissingHandoff));
    assert_eq!(error.to_string(), "no order found");
    assert_eq!(gateway.fetch_calls(), 0, "fail closed means zero fetches");
}

#[tokio::test]
async fn a_failed_order_fetch_propagates_to_the_caller() {
    let gateway = gateway();
    gateway.set_fetch_failing(true);
    let (auth, cart) = signed_in_stores();
    cart.add(cart_line("tee-1", 1950, 1));

    let mut flow = CheckoutFlow::new();
    flow.create_order(&gateway, &cart, &auth)
        .await
        .expect("order should be created");
    flow.open_payment().expect("payment should open");
    flow.confirm_payment(PaymentId::new("PAY456"))
        .expect("payment should confirm");
    let handoff = flow.take_handoff().expect("handoff should be consumable");

    let error = present_success(&gateway, Some(handoff))
        .await
        .expect_err("a dead backend cannot render a success view");
    assert!(matches!(error, CheckoutError::Api(_)));
    assert_eq!(gateway.fetch_calls(), 1);
}

#[tokio::test]
async fn the_wire_total_renders_with_two_decimals() {
    // The order endpoint's envelope, exactly as the backend sends it.
    let wire = r#"{"data": {"orderId": "ORD123", "totalAmount": 499.5}}"#;
    let envelope: tamarind_storefront::api::types::OrderEnvelope =
        serde_json::from_str(wire).expect("envelope should parse");
    let detail: OrderDetail = envelope.data.into();

    let gateway = MockOrderGateway::new(
        CreatedOrder {
            order_id: detail.order_id.clone(),
            total: detail.total_amount,
        },
        detail,
    );
    let (auth, cart) = signed_in_stores();
    cart.add(cart_line("tee-1", 49950, 1));

    let mut flow = CheckoutFlow::new();
    flow.create_order(&gateway, &cart, &auth)
        .await
        .expect("order should be created");
    flow.open_payment().expect("payment should open");
    flow.confirm_payment(PaymentId::new("PAY456"))
        .expect("payment should confirm");
    let handoff = flow.take_handoff().expect("handoff should be consumable");

    let view = present_success(&gateway, Some(handoff))
        .await
        .expect("success view should build");
    assert_eq!(view.amount, "499.50");
}
