//! Wishlist synchronizer.
//!
//! Mirrors the cart synchronizer with two differences: membership checks run
//! against the local copy, and every mutation announces its outcome through
//! the [`Notifier`] itself. A mutation refreshes only when it succeeded; a
//! failed one leaves the view as it was.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sstashed_core::{CanonicalId, ProductId};
use tokio::sync::watch;
use tracing::instrument;

use super::{OpResult, Snapshot, ViewCell};
use crate::error::add_breadcrumb;
use crate::gateway::ApiClient;
use crate::gateway::types::{RawWishlistEntry, WishlistEntry};
use crate::notify::{Notification, Notifier};

/// Ordering for [`WishlistSynchronizer::sorted_by_added`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Keeps a local copy of the authenticated user's wishlist.
#[derive(Clone)]
pub struct WishlistSynchronizer {
    inner: Arc<WishlistInner>,
}

struct WishlistInner {
    client: ApiClient,
    cell: ViewCell<Vec<WishlistEntry>>,
    notifier: Arc<dyn Notifier>,
}

impl WishlistSynchronizer {
    #[must_use]
    pub fn new(client: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            inner: Arc::new(WishlistInner {
                client,
                cell: ViewCell::new(),
                notifier,
            }),
        }
    }

    /// Valid entries in gateway order; empty when unauthenticated.
    #[must_use]
    pub fn entries(&self) -> Vec<WishlistEntry> {
        self.inner.cell.current(self.inner.client.session())
    }

    /// Number of valid entries.
    #[must_use]
    pub fn count(&self) -> usize {
        self.inner
            .cell
            .with_current(self.inner.client.session(), Vec::len)
    }

    /// Entries ordered by when they were added. Entries without a timestamp
    /// sort as if added at the Unix epoch.
    #[must_use]
    pub fn sorted_by_added(&self, order: SortOrder) -> Vec<WishlistEntry> {
        let mut entries = self.entries();
        entries.sort_by_key(|entry| entry.added_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH));
        if order == SortOrder::NewestFirst {
            entries.reverse();
        }
        entries
    }

    /// Whether a product is on the wishlist.
    ///
    /// Compares canonical ids, so `5` and `"5"` match. An entry whose product
    /// carries no id is matched on the entry id instead. Reads local state
    /// only.
    #[must_use]
    pub fn is_member(&self, product_id: impl Into<CanonicalId>) -> bool {
        let target = product_id.into();
        if target.is_empty() {
            return false;
        }
        self.inner
            .cell
            .with_current(self.inner.client.session(), |entries| {
                entries.iter().any(|entry| entry_matches(entry, &target))
            })
    }

    /// Receive every committed wishlist snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot<Vec<WishlistEntry>>> {
        self.inner.cell.subscribe()
    }

    /// Whether a refresh is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.cell.is_loading()
    }

    /// Replace the wishlist with the gateway's copy, minus entries that do
    /// not reference a product.
    #[instrument(skip(self))]
    pub async fn refresh(&self) {
        let client = &self.inner.client;
        self.inner
            .cell
            .refresh_with(client.session(), "wishlist.refresh", || async {
                client.get_wishlist().await.map(valid_entries)
            })
            .await;
    }

    /// Empty the wishlist locally, without a network call.
    pub(crate) fn reset(&self) {
        self.inner.cell.reset(self.inner.client.session().epoch());
    }

    /// Add a product.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add(&self, product_id: &ProductId) -> OpResult {
        add_breadcrumb("wishlist", "add", &[("product_id", product_id.as_str())]);
        let result = self.inner.client.add_to_wishlist(product_id).await;
        let outcome = OpResult::from_gateway(&result, "Failed to add to wishlist");
        self.settle(outcome, "Item added to wishlist").await
    }

    /// Remove a product.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove(&self, product_id: &ProductId) -> OpResult {
        add_breadcrumb("wishlist", "remove", &[("product_id", product_id.as_str())]);
        let result = self.inner.client.remove_from_wishlist(product_id).await;
        let outcome = OpResult::from_gateway(&result, "Failed to remove from wishlist");
        self.settle(outcome, "Item removed from wishlist").await
    }

    /// Add the product if it is not a member, remove it otherwise.
    ///
    /// Membership is read before the round trip, so two toggles fired
    /// back to back may both act on the same state. The next refresh
    /// reconciles the view with whatever the gateway ended up with.
    pub async fn toggle(&self, product_id: &ProductId) -> OpResult {
        if self.is_member(product_id) {
            self.remove(product_id).await
        } else {
            self.add(product_id).await
        }
    }

    /// Remove every entry.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> OpResult {
        add_breadcrumb("wishlist", "clear", &[]);
        let result = self.inner.client.clear_wishlist().await;
        // Gateway messages are not surfaced for this one.
        let outcome = match result {
            Ok(()) => OpResult::Success,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to clear wishlist");
                OpResult::Failure {
                    message: "Failed to clear wishlist".to_string(),
                }
            }
        };
        self.settle(outcome, "Wishlist cleared").await
    }

    async fn settle(&self, outcome: OpResult, success_message: &str) -> OpResult {
        match &outcome {
            OpResult::Success => {
                self.refresh().await;
                self.inner
                    .notifier
                    .notify(Notification::success(success_message));
            }
            OpResult::Failure { message } => {
                self.inner.notifier.notify(Notification::error(message.clone()));
            }
        }
        outcome
    }
}

impl std::fmt::Debug for WishlistSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WishlistSynchronizer")
            .field("count", &self.count())
            .field("loading", &self.is_loading())
            .finish_non_exhaustive()
    }
}

fn entry_matches(entry: &WishlistEntry, target: &CanonicalId) -> bool {
    match &entry.product.id {
        Some(product_id) => product_id.canonical() == target,
        None => entry
            .id
            .as_ref()
            .is_some_and(|entry_id| entry_id.canonical() == target),
    }
}

/// Drop `null` entries and entries without a product. The first entry for
/// a product wins if the gateway repeats one.
fn valid_entries(raw: Vec<Option<RawWishlistEntry>>) -> Vec<WishlistEntry> {
    let total = raw.len();
    let mut seen: HashSet<CanonicalId> = HashSet::new();
    let entries: Vec<WishlistEntry> = raw
        .into_iter()
        .flatten()
        .filter_map(WishlistEntry::from_raw)
        .filter(|entry| {
            entry
                .product
                .id
                .as_ref()
                .is_none_or(|id| seen.insert(id.canonical().clone()))
        })
        .collect();

    if entries.len() != total {
        tracing::debug!(
            dropped = total - entries.len(),
            "Dropped invalid wishlist entries"
        );
    }
    entries
}
