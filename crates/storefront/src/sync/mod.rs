//! Cart and wishlist synchronizers.
//!
//! A synchronizer owns one view of server state and only ever changes it by
//! replacing it with what the gateway returns. Mutations are round trips
//! followed by a refresh; nothing is patched locally.
//!
//! Views are published as revisioned [`Snapshot`]s. A refresh result is
//! committed only if the session it was issued under is still current and no
//! newer refresh has committed in the meantime.

pub mod cart;
pub mod gate;
pub mod wishlist;

use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tokio::sync::watch;
use tracing::debug;

use crate::error::{GatewayError, report_error};
use crate::session::{Session, SessionTicket};

pub use cart::{CartSynchronizer, clamp_quantity, line_subtotal};
pub use gate::{SessionGate, spawn_session_gate};
pub use wishlist::{SortOrder, WishlistSynchronizer};

// =============================================================================
// Operation results
// =============================================================================

/// Outcome of a synchronizer mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpResult {
    Success,
    Failure {
        /// The gateway's message when it sent one, otherwise a generic one.
        message: String,
    },
}

impl OpResult {
    /// Map a gateway result, using `fallback` when the error carries no
    /// structured message.
    #[must_use]
    pub fn from_gateway<T>(result: &Result<T, GatewayError>, fallback: &str) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(e) => Self::Failure {
                message: e.user_message(fallback),
            },
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// The failure message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success => None,
            Self::Failure { message } => Some(message),
        }
    }
}

// =============================================================================
// Snapshots
// =============================================================================

/// A published view of server state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot<T> {
    pub value: T,
    /// Sequence number of the refresh that produced `value`.
    pub revision: u64,
    /// Session epoch `value` belongs to.
    pub epoch: u64,
}

/// Holds one view and decides which refresh results may replace it.
pub(crate) struct ViewCell<T> {
    tx: watch::Sender<Snapshot<T>>,
    next_seq: AtomicU64,
    in_flight: AtomicUsize,
}

impl<T: Clone + Default> ViewCell<T> {
    pub(crate) fn new() -> Self {
        let (tx, _) = watch::channel(Snapshot::default());
        Self {
            tx,
            next_seq: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Reserve the sequence number for a new refresh.
    fn begin(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Replace the view with `value` unless the session moved on or a newer
    /// refresh already committed. Returns whether the value was stored.
    fn commit(&self, seq: u64, ticket: SessionTicket, session: &Session, value: T) -> bool {
        self.tx.send_if_modified(|snapshot| {
            if !session.is_current(ticket) || seq <= snapshot.revision {
                return false;
            }
            *snapshot = Snapshot {
                value,
                revision: seq,
                epoch: ticket.epoch,
            };
            true
        })
    }

    /// Force the empty value for `epoch`, superseding every refresh issued
    /// before this call.
    pub(crate) fn reset(&self, epoch: u64) {
        let revision = self.begin();
        self.tx.send_replace(Snapshot {
            value: T::default(),
            revision,
            epoch,
        });
    }

    /// Current value, or the empty value if it belongs to another session.
    pub(crate) fn current(&self, session: &Session) -> T {
        let epoch = session.epoch();
        let snapshot = self.tx.borrow();
        if snapshot.epoch == epoch {
            snapshot.value.clone()
        } else {
            T::default()
        }
    }

    /// Read the current value in place. `f` sees the empty value if the
    /// stored one belongs to another session.
    pub(crate) fn with_current<R>(&self, session: &Session, f: impl FnOnce(&T) -> R) -> R {
        let epoch = session.epoch();
        let snapshot = self.tx.borrow();
        if snapshot.epoch == epoch {
            f(&snapshot.value)
        } else {
            f(&T::default())
        }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.tx.subscribe()
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Fetch with `fetch` and commit the outcome.
    ///
    /// Unauthenticated: commit the empty value without calling `fetch`.
    /// Not found: empty, not reported. Unauthorized: empty; the interceptor
    /// already tore the session down. Anything else: empty and reported.
    pub(crate) async fn refresh_with<F, Fut>(&self, session: &Session, operation: &str, fetch: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let ticket = session.ticket();
        let seq = self.begin();

        if !ticket.authenticated {
            self.commit(seq, ticket, session, T::default());
            return;
        }

        let value = {
            let _loading = LoadingGuard::new(&self.in_flight);
            match fetch().await {
                Ok(value) => value,
                Err(e) if e.is_not_found() || e.is_unauthorized() => {
                    debug!(error = %e, operation, "Treating failed fetch as empty");
                    T::default()
                }
                Err(e) => {
                    report_error(&e, operation);
                    T::default()
                }
            }
        };

        if !self.commit(seq, ticket, session, value) {
            debug!(operation, seq, "Discarded stale refresh result");
        }
    }
}

/// Counts a refresh as in flight for as long as it is alive.
struct LoadingGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> LoadingGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}
