//! Sstashed storefront client library.
//!
//! Talks to the marketplace REST gateway and keeps local copies of the
//! signed-in user's cart and wishlist in sync with it. Front ends hold a
//! [`Storefront`] and read views from its synchronizers; every change goes
//! through the gateway and comes back through a refresh.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod gateway;
pub mod notify;
pub mod session;
pub mod state;
pub mod sync;

pub use config::{ConfigError, Credentials, GatewayConfig, StorefrontConfig};
pub use error::{GatewayError, report_error};
pub use gateway::ApiClient;
pub use notify::{Notification, NotificationLevel, Notifier, RecordingNotifier, TracingNotifier};
pub use session::{AuthState, EndReason, Session};
pub use state::Storefront;
pub use sync::{CartSynchronizer, OpResult, SessionGate, Snapshot, WishlistSynchronizer};
