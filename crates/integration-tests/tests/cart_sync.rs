//! Cart synchronization against a simulated gateway.
//!
//! Covers the refresh-after-every-mutation contract, pass-through of
//! gateway totals, error message selection and the signed-out short circuit.

#![allow(clippy::unwrap_used)]

use serde_json::json;
use sstashed_core::{CartLineId, ProductId};
use sstashed_integration_tests::{
    api, cart_json, cart_line_json, empty_cart, product_json, request_count, signed_in, storefront,
};
use sstashed_storefront::OpResult;
use sstashed_storefront::gateway::types::CartView;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_cart(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(api("/cart")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

// =============================================================================
// Mutations
// =============================================================================

#[tokio::test]
async fn test_add_item_posts_and_adopts_gateway_cart() {
    let server = MockServer::start().await;
    let (storefront, _) = signed_in(&server).await;

    let shawl = product_json(9, "Pashmina Shawl", 2499.0, 4);
    Mock::given(method("POST"))
        .and(path(api("/cart/items")))
        .and(body_json(json!({"productId": 9, "quantity": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .expect(1)
        .mount(&server)
        .await;
    // Totals deliberately disagree with the lines: the client must not recompute.
    mount_cart(
        &server,
        cart_json(&[cart_line_json(1, &shawl, 2)], 4998.0, 7),
    )
    .await;

    let result = storefront.cart().add_item(&ProductId::from(9), 2).await;

    assert_eq!(result, OpResult::Success);
    let cart = storefront.cart().view();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.item_count, 7);
    assert_eq!(storefront.cart().item_count(), 7);
    assert_eq!(cart.total.to_string(), "4998.00");
    assert_eq!(request_count(&server, "GET", &api("/cart")).await, 1);
}

#[tokio::test]
async fn test_update_quantity_puts_and_refreshes() {
    let server = MockServer::start().await;
    let (storefront, _) = signed_in(&server).await;

    let vase = product_json(9, "Terracotta Vase", 100.0, 5);
    mount_cart(&server, cart_json(&[cart_line_json(1, &vase, 2)], 200.0, 2)).await;
    storefront.cart().refresh().await;
    assert_eq!(storefront.cart().item_count(), 2);
    server.reset().await;

    let updated = cart_json(&[cart_line_json(1, &vase, 3)], 300.0, 3);
    Mock::given(method("PUT"))
        .and(path(api("/cart/items/1")))
        .and(body_json(json!({"quantity": 3})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    mount_cart(&server, updated.clone()).await;

    let result = storefront
        .cart()
        .update_quantity(&CartLineId::from(1), 3)
        .await;

    assert!(result.is_success());
    let expected: CartView = serde_json::from_value(updated).unwrap();
    let cart = storefront.cart().view();
    assert_eq!(cart, expected);
    assert_eq!(cart.item_count, 3);
    assert_eq!(cart.total.to_string(), "300.00");
    server.verify().await;
}

#[tokio::test]
async fn test_remove_item_deletes_line() {
    let server = MockServer::start().await;
    let (storefront, _) = signed_in(&server).await;

    Mock::given(method("DELETE"))
        .and(path(api("/cart/items/31")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    mount_cart(&server, empty_cart()).await;

    let result = storefront.cart().remove_item(&CartLineId::from("31")).await;

    assert!(result.is_success());
    assert!(storefront.cart().view().is_empty());
    assert_eq!(storefront.cart().item_count(), 0);
}

#[tokio::test]
async fn test_clear_twice_succeeds_both_times() {
    let server = MockServer::start().await;
    let (storefront, _) = signed_in(&server).await;

    Mock::given(method("DELETE"))
        .and(path(api("/cart")))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api("/cart")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert!(storefront.cart().clear().await.is_success());
    assert!(storefront.cart().clear().await.is_success());
    assert_eq!(storefront.cart().view(), CartView::empty());
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_gateway_message_is_surfaced_and_cart_still_refreshes() {
    let server = MockServer::start().await;
    let (storefront, _) = signed_in(&server).await;

    let shawl = product_json(9, "Pashmina Shawl", 2499.0, 2);
    Mock::given(method("POST"))
        .and(path(api("/cart/items")))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"error": "Only 2 items available", "message": "Bad Request"})),
        )
        .mount(&server)
        .await;
    mount_cart(&server, cart_json(&[cart_line_json(1, &shawl, 2)], 4998.0, 2)).await;

    let result = storefront.cart().add_item(&ProductId::from(9), 5).await;

    assert_eq!(result.message(), Some("Only 2 items available"));
    assert_eq!(request_count(&server, "GET", &api("/cart")).await, 1);
    assert_eq!(storefront.cart().item_count(), 2);
}

#[tokio::test]
async fn test_unstructured_failure_uses_fallback_message() {
    let server = MockServer::start().await;
    let (storefront, _) = signed_in(&server).await;

    Mock::given(method("POST"))
        .and(path(api("/cart/items")))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(api("/cart/items/1")))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(api("/cart/items/1")))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(api("/cart")))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({})))
        .mount(&server)
        .await;
    mount_cart(&server, empty_cart()).await;

    let cart = storefront.cart();
    let line = CartLineId::from(1);
    assert_eq!(
        cart.add_item(&ProductId::from(9), 1).await.message(),
        Some("Failed to add item to cart")
    );
    assert_eq!(
        cart.update_quantity(&line, 2).await.message(),
        Some("Failed to update quantity")
    );
    assert_eq!(cart.remove_item(&line).await.message(), Some("Failed to remove item"));
    assert_eq!(cart.clear().await.message(), Some("Failed to clear cart"));
    assert_eq!(request_count(&server, "GET", &api("/cart")).await, 4);
}

#[tokio::test]
async fn test_missing_cart_reads_as_empty() {
    let server = MockServer::start().await;
    let (storefront, _) = signed_in(&server).await;

    let shawl = product_json(9, "Pashmina Shawl", 2499.0, 4);
    mount_cart(&server, cart_json(&[cart_line_json(1, &shawl, 1)], 2499.0, 1)).await;
    storefront.cart().refresh().await;
    assert!(!storefront.cart().view().is_empty());
    server.reset().await;

    Mock::given(method("GET"))
        .and(path(api("/cart")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Cart not found"})))
        .mount(&server)
        .await;

    storefront.cart().refresh().await;

    assert_eq!(storefront.cart().view(), CartView::empty());
    assert!(!storefront.cart().is_loading());
}

#[tokio::test]
async fn test_null_product_fields_keep_gateway_totals() {
    let server = MockServer::start().await;
    let (storefront, _) = signed_in(&server).await;

    mount_cart(
        &server,
        json!({
            "items": [{
                "id": 1,
                "productId": 9,
                "product": {"id": 9, "name": "Terracotta Vase", "price": 100, "stockQuantity": null, "imageUrl": null},
                "price": 100,
                "quantity": 2,
            }],
            "total": 200,
            "itemCount": 2,
        }),
    )
    .await;

    storefront.cart().refresh().await;

    let cart = storefront.cart().view();
    assert_eq!(cart.item_count, 2);
    assert_eq!(cart.total.to_string(), "200.00");
    assert_eq!(cart.items[0].product_snapshot.stock_quantity, 0);
    assert_eq!(cart.items[0].product_snapshot.image_url, None);
}

#[tokio::test]
async fn test_server_error_on_refresh_resets_to_empty() {
    let server = MockServer::start().await;
    let (storefront, _) = signed_in(&server).await;

    let shawl = product_json(9, "Pashmina Shawl", 2499.0, 4);
    mount_cart(&server, cart_json(&[cart_line_json(1, &shawl, 1)], 2499.0, 1)).await;
    storefront.cart().refresh().await;
    server.reset().await;

    Mock::given(method("GET"))
        .and(path(api("/cart")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    storefront.cart().refresh().await;

    assert!(storefront.cart().view().is_empty());
    assert_eq!(storefront.cart().item_count(), 0);
}

// =============================================================================
// Signed out
// =============================================================================

#[tokio::test]
async fn test_signed_out_refresh_skips_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api("/cart")))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty_cart()))
        .expect(0)
        .mount(&server)
        .await;

    let (storefront, _) = storefront(&server);
    storefront.cart().refresh().await;

    assert_eq!(storefront.cart().view(), CartView::empty());
    server.verify().await;
}
