//! Catalog caching and account endpoints.

#![allow(clippy::unwrap_used)]

use sstashed_core::ProductId;
use sstashed_integration_tests::{api, product_json, signed_in, storefront};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_catalog_reads_are_cached_until_invalidated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api("/products/9")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(product_json(9, "Pashmina Shawl", 2499.0, 4)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let (storefront, _) = storefront(&server);
    let client = storefront.client();
    let first = client.get_product(&ProductId::from(9)).await.unwrap();
    let second = client.get_product(&ProductId::from("9")).await.unwrap();
    assert_eq!(first, second);

    client.invalidate_catalog();
    client.get_product(&ProductId::from(9)).await.unwrap();
    server.verify().await;
}

// =============================================================================
// Account
// =============================================================================

#[tokio::test]
async fn test_missing_default_address_is_none() {
    let server = MockServer::start().await;
    let (storefront, _) = signed_in(&server).await;
    Mock::given(method("GET"))
        .and(path(api("/profile/addresses/default")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let address = storefront.client().default_address().await.unwrap();

    assert!(address.is_none());
}
