//! Cart synchronizer.
//!
//! Every mutation is a gateway round trip followed by an unconditional
//! refresh, whether the mutation succeeded or not. Totals and item counts
//! are whatever the gateway computed; only the per-line subtotal is derived
//! locally. Mutations report their outcome as an [`OpResult`] and leave
//! notifying the user to the caller.

use std::sync::Arc;

use sstashed_core::{CartLineId, Price, ProductId};
use tokio::sync::watch;
use tracing::instrument;

use super::{OpResult, Snapshot, ViewCell};
use crate::error::{GatewayError, add_breadcrumb};
use crate::gateway::ApiClient;
use crate::gateway::types::{CartLine, CartView};

const ADD_FALLBACK: &str = "Failed to add item to cart";
const UPDATE_FALLBACK: &str = "Failed to update quantity";
const REMOVE_FALLBACK: &str = "Failed to remove item";
const CLEAR_FALLBACK: &str = "Failed to clear cart";

/// Keeps a local copy of the authenticated user's cart.
#[derive(Clone)]
pub struct CartSynchronizer {
    inner: Arc<CartInner>,
}

struct CartInner {
    client: ApiClient,
    cell: ViewCell<CartView>,
}

impl CartSynchronizer {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            inner: Arc::new(CartInner {
                client,
                cell: ViewCell::new(),
            }),
        }
    }

    /// The current cart; empty when unauthenticated.
    #[must_use]
    pub fn view(&self) -> CartView {
        self.inner.cell.current(self.inner.client.session())
    }

    /// Item count as reported by the gateway.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.inner
            .cell
            .with_current(self.inner.client.session(), |cart| cart.item_count)
    }

    /// Receive every committed cart snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot<CartView>> {
        self.inner.cell.subscribe()
    }

    /// Whether a refresh is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.cell.is_loading()
    }

    /// Replace the cart with the gateway's copy.
    ///
    /// Unauthenticated: empties the cart without a network call. A user
    /// without a cart yet (404) gets an empty cart; other failures also
    /// empty it and are reported.
    #[instrument(skip(self))]
    pub async fn refresh(&self) {
        let client = &self.inner.client;
        self.inner
            .cell
            .refresh_with(client.session(), "cart.refresh", || client.get_cart())
            .await;
    }

    /// Empty the cart locally, without a network call.
    pub(crate) fn reset(&self) {
        self.inner.cell.reset(self.inner.client.session().epoch());
    }

    /// Add `quantity` units of a product.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_item(&self, product_id: &ProductId, quantity: u32) -> OpResult {
        add_breadcrumb("cart", "add item", &[("product_id", product_id.as_str())]);
        let result = self.inner.client.add_cart_item(product_id, quantity).await;
        self.settle(result, ADD_FALLBACK).await
    }

    /// Add a single unit of a product.
    pub async fn add_one(&self, product_id: &ProductId) -> OpResult {
        self.add_item(product_id, 1).await
    }

    /// Set a line's quantity. The value is forwarded as is; clamp it with
    /// [`clamp_quantity`] first.
    #[instrument(skip(self), fields(line_id = %line_id))]
    pub async fn update_quantity(&self, line_id: &CartLineId, quantity: u32) -> OpResult {
        add_breadcrumb("cart", "update quantity", &[("line_id", line_id.as_str())]);
        let result = self.inner.client.update_cart_item(line_id, quantity).await;
        self.settle(result, UPDATE_FALLBACK).await
    }

    /// Remove a line.
    #[instrument(skip(self), fields(line_id = %line_id))]
    pub async fn remove_item(&self, line_id: &CartLineId) -> OpResult {
        add_breadcrumb("cart", "remove item", &[("line_id", line_id.as_str())]);
        let result = self.inner.client.remove_cart_item(line_id).await;
        self.settle(result, REMOVE_FALLBACK).await
    }

    /// Remove every line.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> OpResult {
        add_breadcrumb("cart", "clear", &[]);
        let result = self.inner.client.clear_cart().await;
        self.settle(result, CLEAR_FALLBACK).await
    }

    async fn settle(&self, result: Result<(), GatewayError>, fallback: &str) -> OpResult {
        let outcome = OpResult::from_gateway(&result, fallback);
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Cart mutation failed");
        }
        self.refresh().await;
        outcome
    }
}

impl std::fmt::Debug for CartSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartSynchronizer")
            .field("item_count", &self.item_count())
            .field("loading", &self.is_loading())
            .finish()
    }
}

/// `price * quantity` for one line.
#[must_use]
pub fn line_subtotal(line: &CartLine) -> Price {
    line.subtotal()
}

/// Clamp a requested quantity to `[1, stock]`.
///
/// With no stock at all the result is 1; the gateway rejects it with a
/// message the caller can show.
#[must_use]
pub fn clamp_quantity(requested: u32, stock: u32) -> u32 {
    requested.clamp(1, stock.max(1))
}
