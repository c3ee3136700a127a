//! Integration tests for the Sstashed storefront client.
//!
//! Every test runs the real [`Storefront`] against a `wiremock` server that
//! plays the REST gateway, so request shapes, status handling and the
//! cart/wishlist synchronization are exercised end to end.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p sstashed-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_sync` - cart mutations and refresh behavior
//! - `wishlist_sync` - wishlist membership, filtering and notifications
//! - `session_gate` - login, logout, `401` teardown and cross-flow helpers
//! - `catalog_account` - catalog caching and account endpoints

#![allow(clippy::missing_panics_doc)]

use std::sync::Arc;

use secrecy::SecretString;
use serde_json::{Value, json};
use sstashed_core::Email;
use sstashed_storefront::{GatewayConfig, RecordingNotifier, Storefront};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path prefix the simulated gateway serves under.
pub const API_PREFIX: &str = "/api";

pub const TEST_EMAIL: &str = "asha@example.com";
pub const TEST_PASSWORD: &str = "correct horse battery staple";
pub const TEST_TOKEN: &str = "tok_9f2c4e7a1b3d5f60";

/// Gateway path for an endpoint, e.g. `api("/cart")` is `/api/cart`.
#[must_use]
pub fn api(endpoint: &str) -> String {
    format!("{API_PREFIX}{endpoint}")
}

/// A signed-out storefront pointed at `server`, recording its notifications.
#[must_use]
pub fn storefront(server: &MockServer) -> (Storefront, RecordingNotifier) {
    let config = GatewayConfig::new(&format!("{}{API_PREFIX}", server.uri()))
        .expect("mock server url is a valid gateway url");
    let notifier = RecordingNotifier::new();
    let storefront =
        Storefront::new(config, Arc::new(notifier.clone())).expect("http client builds");
    (storefront, notifier)
}

/// Mount a `POST /auth/login` that accepts any credentials.
pub async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(api("/auth/login")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({
                "token": TEST_TOKEN,
                "user": user_json(),
            })),
        )
        .mount(server)
        .await;
}

/// Mount `GET` handlers for the cart and the wishlist.
pub async fn mount_views(server: &MockServer, cart: Value, wishlist: Value) {
    Mock::given(method("GET"))
        .and(path(api("/cart")))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(api("/wishlist")))
        .respond_with(ResponseTemplate::new(200).set_body_json(wishlist))
        .mount(server)
        .await;
}

/// A storefront that has logged in with empty cart and wishlist.
///
/// The server is reset afterwards, so the test starts with no mocks mounted
/// and no recorded requests.
pub async fn signed_in(server: &MockServer) -> (Storefront, RecordingNotifier) {
    mount_login(server).await;
    mount_views(server, empty_cart(), json!([])).await;

    let (storefront, notifier) = storefront(server);
    let email = Email::parse(TEST_EMAIL).expect("valid test email");
    storefront
        .login(&email, &SecretString::from(TEST_PASSWORD))
        .await
        .expect("login against mock gateway");

    server.reset().await;
    notifier.drain();
    (storefront, notifier)
}

/// Number of requests the server has seen for `verb` and the full `path`.
pub async fn request_count(server: &MockServer, verb: &str, full_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == verb && r.url.path() == full_path)
        .count()
}

// =============================================================================
// Payload builders
// =============================================================================

#[must_use]
pub fn user_json() -> Value {
    json!({
        "id": 42,
        "firstName": "Asha",
        "lastName": "Iyer",
        "email": TEST_EMAIL,
        "phone": "9876543210",
        "role": "CUSTOMER",
    })
}

#[must_use]
pub fn product_json(id: i64, name: &str, price: f64, stock: u32) -> Value {
    json!({
        "id": id,
        "name": name,
        "price": price,
        "stockQuantity": stock,
        "imageUrl": format!("https://cdn.example.com/products/{id}.jpg"),
        "categoryName": "Textiles",
    })
}

/// One cart line; `product` is embedded as the gateway does.
#[must_use]
pub fn cart_line_json(line_id: i64, product: &Value, quantity: u32) -> Value {
    json!({
        "id": line_id,
        "productId": product["id"],
        "product": product,
        "price": product["price"],
        "quantity": quantity,
    })
}

/// A cart payload with gateway-computed totals, passed through verbatim.
#[must_use]
pub fn cart_json(lines: &[Value], total: f64, item_count: u32) -> Value {
    json!({
        "items": lines,
        "total": total,
        "itemCount": item_count,
    })
}

#[must_use]
pub fn empty_cart() -> Value {
    cart_json(&[], 0.0, 0)
}

#[must_use]
pub fn wishlist_entry_json(entry_id: i64, product: Value, added_at: &str) -> Value {
    json!({
        "id": entry_id,
        "product": product,
        "addedAt": added_at,
    })
}
