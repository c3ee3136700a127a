//! Session gate: keeps both synchronizers in step with the session.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::task::JoinHandle;
use tracing::{debug, instrument};

use super::{CartSynchronizer, WishlistSynchronizer};
use crate::session::Session;

/// Resets or refreshes the cart and wishlist on authentication changes.
#[derive(Clone)]
pub struct SessionGate {
    inner: Arc<GateInner>,
}

struct GateInner {
    session: Session,
    cart: CartSynchronizer,
    wishlist: WishlistSynchronizer,
    /// Highest session epoch already acted on.
    handled_epoch: AtomicU64,
}

impl SessionGate {
    #[must_use]
    pub fn new(session: Session, cart: CartSynchronizer, wishlist: WishlistSynchronizer) -> Self {
        Self {
            inner: Arc::new(GateInner {
                session,
                cart,
                wishlist,
                handled_epoch: AtomicU64::new(0),
            }),
        }
    }

    /// React to an authentication change.
    ///
    /// Signed out: both views are emptied without a network call. Signed in:
    /// both synchronizers refresh concurrently.
    #[instrument(skip(self))]
    pub async fn on_auth_change(&self, is_authenticated: bool) {
        self.inner
            .handled_epoch
            .fetch_max(self.inner.session.epoch(), Ordering::SeqCst);

        if is_authenticated {
            tokio::join!(self.inner.cart.refresh(), self.inner.wishlist.refresh());
        } else {
            self.inner.cart.reset();
            self.inner.wishlist.reset();
        }
    }

    /// Whether the transition at `epoch` has already been acted on.
    fn is_handled(&self, epoch: u64) -> bool {
        self.inner.handled_epoch.load(Ordering::SeqCst) >= epoch
    }
}

impl std::fmt::Debug for SessionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGate")
            .field("handled_epoch", &self.inner.handled_epoch.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Run `gate` for every session transition. Abort the returned handle to stop.
///
/// Transitions that were already handled directly (for example by
/// `Storefront::login`) are skipped.
pub fn spawn_session_gate(gate: SessionGate) -> JoinHandle<()> {
    let mut changes = gate.inner.session.subscribe();
    tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let state = *changes.borrow_and_update();
            if gate.is_handled(state.epoch) {
                debug!(epoch = state.epoch, "Session transition already handled");
                continue;
            }
            gate.on_auth_change(state.authenticated).await;
        }
    })
}
