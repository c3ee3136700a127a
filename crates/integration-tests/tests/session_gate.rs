//! Session transitions and the flows that span both synchronizers.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use sstashed_core::{AddressId, Email, PaymentMethod, ProductId};
use sstashed_integration_tests::{
    TEST_EMAIL, TEST_PASSWORD, TEST_TOKEN, api, cart_json, cart_line_json, empty_cart,
    mount_login, mount_views, product_json, request_count, signed_in, storefront, user_json,
    wishlist_entry_json,
};
use sstashed_storefront::gateway::types::CreateOrderRequest;
use sstashed_storefront::gateway::REQUEST_ID_HEADER;
use sstashed_storefront::{EndReason, GatewayError};
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn filled_cart() -> serde_json::Value {
    let shawl = product_json(9, "Pashmina Shawl", 2499.0, 4);
    cart_json(&[cart_line_json(1, &shawl, 1)], 2499.0, 1)
}

fn filled_wishlist() -> serde_json::Value {
    json!([wishlist_entry_json(
        3,
        product_json(5, "Brass Diya", 349.0, 12),
        "2026-03-01T10:00:00Z"
    )])
}

// =============================================================================
// Sign in
// =============================================================================

#[tokio::test]
async fn test_login_loads_both_views_with_bearer_token() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    for endpoint in ["/cart", "/wishlist"] {
        let body = if endpoint == "/cart" {
            filled_cart()
        } else {
            filled_wishlist()
        };
        Mock::given(method("GET"))
            .and(path(api(endpoint)))
            .and(header("Authorization", format!("Bearer {TEST_TOKEN}").as_str()))
            .and(header_exists(REQUEST_ID_HEADER))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;
    }

    let (storefront, _) = storefront(&server);
    let user = storefront
        .login(
            &Email::parse(TEST_EMAIL).unwrap(),
            &SecretString::from(TEST_PASSWORD),
        )
        .await
        .unwrap();

    assert_eq!(user.full_name(), "Asha Iyer");
    assert!(storefront.session().is_authenticated());
    assert_eq!(storefront.cart().item_count(), 1);
    assert!(storefront.wishlist().is_member(5));
    server.verify().await;
}

#[tokio::test]
async fn test_rejected_login_leaves_session_signed_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(api("/auth/login")))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid email or password"})),
        )
        .mount(&server)
        .await;

    let (storefront, _) = storefront(&server);
    let err = storefront
        .login(
            &Email::parse(TEST_EMAIL).unwrap(),
            &SecretString::from("wrong"),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Unauthorized { .. }));
    assert_eq!(err.user_message("Login failed"), "Invalid email or password");
    assert!(!storefront.session().is_authenticated());
    assert_eq!(request_count(&server, "GET", &api("/cart")).await, 0);
}

#[tokio::test]
async fn test_resume_validates_token_against_profile() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api("/profile")))
        .and(header("Authorization", format!("Bearer {TEST_TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .expect(1)
        .mount(&server)
        .await;
    mount_views(&server, filled_cart(), filled_wishlist()).await;

    let (storefront, _) = storefront(&server);
    let user = storefront
        .resume(SecretString::from(TEST_TOKEN))
        .await
        .unwrap();

    assert_eq!(user.email.as_str(), TEST_EMAIL);
    assert_eq!(storefront.wishlist().count(), 1);
    assert_eq!(storefront.cart().item_count(), 1);
}

// =============================================================================
// Sign out
// =============================================================================

#[tokio::test]
async fn test_logout_empties_views_without_refetching() {
    let server = MockServer::start().await;
    let (storefront, _) = signed_in(&server).await;
    mount_views(&server, filled_cart(), filled_wishlist()).await;
    storefront.cart().refresh().await;
    storefront.wishlist().refresh().await;
    server.reset().await;

    Mock::given(method("POST"))
        .and(path(api("/auth/logout")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    storefront.logout().await;

    assert!(!storefront.session().is_authenticated());
    assert!(storefront.cart().view().is_empty());
    assert_eq!(storefront.wishlist().count(), 0);
    assert!(!storefront.wishlist().is_member(5));
    assert_eq!(request_count(&server, "GET", &api("/cart")).await, 0);
    assert_eq!(request_count(&server, "GET", &api("/wishlist")).await, 0);
}

#[tokio::test]
async fn test_logout_ends_session_even_if_gateway_fails() {
    let server = MockServer::start().await;
    let (storefront, _) = signed_in(&server).await;
    Mock::given(method("POST"))
        .and(path(api("/auth/logout")))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    storefront.logout().await;

    assert!(!storefront.session().is_authenticated());
    assert_eq!(
        storefront.session().subscribe().borrow().ended_by,
        Some(EndReason::Logout)
    );
}

#[tokio::test]
async fn test_refresh_in_flight_during_logout_is_discarded() {
    let server = MockServer::start().await;
    let (storefront, _) = signed_in(&server).await;

    Mock::given(method("GET"))
        .and(path(api("/cart")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(filled_cart())
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(api("/auth/logout")))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let cart = storefront.cart().clone();
    let pending = tokio::spawn(async move { cart.refresh().await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    storefront.logout().await;
    pending.await.unwrap();

    assert!(storefront.cart().view().is_empty());
    // The late response never reached the published snapshot either.
    assert!(storefront.cart().subscribe().borrow().value.is_empty());
    assert!(!storefront.cart().is_loading());
}

// =============================================================================
// 401 teardown
// =============================================================================

#[tokio::test]
async fn test_unauthorized_response_tears_down_session_and_views() {
    let server = MockServer::start().await;
    let (storefront, notifier) = signed_in(&server).await;
    let gate = storefront.spawn_session_gate();

    mount_views(&server, filled_cart(), filled_wishlist()).await;
    storefront.cart().refresh().await;
    storefront.wishlist().refresh().await;
    assert_eq!(storefront.wishlist().count(), 1);
    server.reset().await;

    Mock::given(method("POST"))
        .and(path(api("/cart/items")))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Token expired"})))
        .mount(&server)
        .await;

    let result = storefront.cart().add_item(&ProductId::from(9), 1).await;

    assert_eq!(result.message(), Some("Token expired"));
    assert!(!storefront.session().is_authenticated());
    assert_eq!(
        storefront.session().subscribe().borrow().ended_by,
        Some(EndReason::Unauthorized)
    );
    assert!(storefront.cart().view().is_empty());
    assert!(!storefront.wishlist().is_member(5));
    // Signed out now, so the post-mutation refresh stays local.
    assert_eq!(request_count(&server, "GET", &api("/cart")).await, 0);

    let mut wishlist = storefront.wishlist().subscribe();
    tokio::time::timeout(
        Duration::from_secs(2),
        wishlist.wait_for(|snapshot| snapshot.value.is_empty()),
    )
    .await
    .unwrap()
    .unwrap();

    assert!(notifier.notifications().is_empty());
    gate.abort();
}

#[tokio::test]
async fn test_unauthorized_on_anonymous_login_does_not_touch_session() {
    let server = MockServer::start().await;
    let (storefront, _) = signed_in(&server).await;
    Mock::given(method("POST"))
        .and(path(api("/auth/login")))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = storefront
        .client()
        .login(
            &Email::parse("someone.else@example.com").unwrap(),
            &SecretString::from("nope"),
        )
        .await;

    assert!(result.is_err());
    assert!(storefront.session().is_authenticated());
}

// =============================================================================
// Cross-synchronizer flows
// =============================================================================

#[tokio::test]
async fn test_move_to_cart_removes_from_wishlist_on_success() {
    let server = MockServer::start().await;
    let (storefront, notifier) = signed_in(&server).await;

    Mock::given(method("POST"))
        .and(path(api("/cart/items")))
        .and(body_json(json!({"productId": 5, "quantity": 1})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(api("/wishlist/products/5")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let diya = product_json(5, "Brass Diya", 349.0, 12);
    mount_views(
        &server,
        cart_json(&[cart_line_json(2, &diya, 1)], 349.0, 1),
        json!([]),
    )
    .await;

    let result = storefront.move_to_cart(&ProductId::from(5)).await;

    assert!(result.is_success());
    assert_eq!(storefront.cart().item_count(), 1);
    assert!(!storefront.wishlist().is_member(5));
    assert_eq!(notifier.notifications().len(), 1);
    server.verify().await;
}

#[tokio::test]
async fn test_move_to_cart_keeps_wishlist_entry_on_failure() {
    let server = MockServer::start().await;
    let (storefront, _) = signed_in(&server).await;
    mount_views(&server, empty_cart(), filled_wishlist()).await;
    storefront.wishlist().refresh().await;

    Mock::given(method("POST"))
        .and(path(api("/cart/items")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "Out of stock"})))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(api("/wishlist/products/5")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = storefront.move_to_cart(&ProductId::from(5)).await;

    assert_eq!(result.message(), Some("Out of stock"));
    assert!(storefront.wishlist().is_member(5));
    server.verify().await;
}

#[tokio::test]
async fn test_place_order_clears_cart() {
    let server = MockServer::start().await;
    let (storefront, _) = signed_in(&server).await;

    Mock::given(method("POST"))
        .and(path(api("/orders")))
        .and(body_json(json!({"addressId": 11, "paymentMethod": "COD"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 501,
            "orderNumber": "ORD-2026-0501",
            "status": "PENDING",
            "paymentMethod": "COD",
            "paymentStatus": "PENDING",
            "totalAmount": 2499.0,
            "orderDate": "2026-10-18T09:15:00",
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(api("/cart")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api("/cart")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let order = storefront
        .place_order(&CreateOrderRequest {
            address_id: AddressId::from(11),
            payment_method: PaymentMethod::Cod,
        })
        .await
        .unwrap();

    assert_eq!(order.display_number(), "ORD-2026-0501");
    assert!(storefront.cart().view().is_empty());
    server.verify().await;
}
