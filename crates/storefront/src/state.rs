//! Storefront root object shared by front ends.

use std::sync::Arc;

use secrecy::SecretString;
use sstashed_core::{Email, ProductId};
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::config::{Credentials, GatewayConfig};
use crate::error::{GatewayError, add_breadcrumb};
use crate::gateway::ApiClient;
use crate::gateway::types::{CreateOrderRequest, Order, RegisterInput, UserProfile};
use crate::notify::Notifier;
use crate::session::{AuthSession, EndReason, Session};
use crate::sync::{
    CartSynchronizer, OpResult, SessionGate, WishlistSynchronizer, spawn_session_gate,
};

/// Application root: owns the gateway client, the session and both
/// synchronizers.
///
/// This struct is cheaply cloneable via `Arc`; hand clones to whatever needs
/// cart or wishlist state instead of keeping globals.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    client: ApiClient,
    session: Session,
    cart: CartSynchronizer,
    wishlist: WishlistSynchronizer,
    gate: SessionGate,
}

impl Storefront {
    /// Wire up a storefront against the configured gateway. Starts signed out.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: GatewayConfig, notifier: Arc<dyn Notifier>) -> Result<Self, GatewayError> {
        let session = Session::new();
        let client = ApiClient::new(config, session.clone())?;
        let cart = CartSynchronizer::new(client.clone());
        let wishlist = WishlistSynchronizer::new(client.clone(), notifier);
        let gate = SessionGate::new(session.clone(), cart.clone(), wishlist.clone());

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                client,
                session,
                cart,
                wishlist,
                gate,
            }),
        })
    }

    /// Get a reference to the gateway client.
    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.inner.client
    }

    /// Get a reference to the session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Get a reference to the cart synchronizer.
    #[must_use]
    pub fn cart(&self) -> &CartSynchronizer {
        &self.inner.cart
    }

    /// Get a reference to the wishlist synchronizer.
    #[must_use]
    pub fn wishlist(&self) -> &WishlistSynchronizer {
        &self.inner.wishlist
    }

    /// Get a reference to the session gate.
    #[must_use]
    pub fn gate(&self) -> &SessionGate {
        &self.inner.gate
    }

    /// Keep the synchronizers in step with session transitions that happen
    /// outside this object, such as a `401` teardown.
    #[must_use]
    pub fn spawn_session_gate(&self) -> JoinHandle<()> {
        spawn_session_gate(self.inner.gate.clone())
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Log in and load the user's cart and wishlist.
    ///
    /// # Errors
    ///
    /// Returns the gateway error if the credentials are rejected.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<UserProfile, GatewayError> {
        let (token, user) = self.inner.client.login(email, password).await?;
        Ok(self.start(token, user).await)
    }

    /// Create an account, sign in as it and load its (empty) cart and
    /// wishlist.
    ///
    /// # Errors
    ///
    /// Returns the gateway error if registration is rejected.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: &RegisterInput) -> Result<UserProfile, GatewayError> {
        let (token, user) = self.inner.client.register(input).await?;
        Ok(self.start(token, user).await)
    }

    /// Restore a session from a previously issued token.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the token is no longer valid.
    #[instrument(skip_all)]
    pub async fn resume(&self, token: SecretString) -> Result<UserProfile, GatewayError> {
        let user = self.inner.client.whoami(&token).await?;
        Ok(self.start(token, user).await)
    }

    /// Authenticate with configured credentials.
    ///
    /// # Errors
    ///
    /// Returns the gateway error if the credentials are rejected.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<UserProfile, GatewayError> {
        match credentials {
            Credentials::Token(token) => self.resume(token.clone()).await,
            Credentials::Password { email, password } => self.login(email, password).await,
        }
    }

    async fn start(&self, token: SecretString, user: UserProfile) -> UserProfile {
        self.inner
            .session
            .establish(AuthSession::new(token, user.clone()));
        self.inner.gate.on_auth_change(true).await;
        user
    }

    /// Log out: tell the gateway (best effort), then drop the session and
    /// empty both views.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        if self.inner.session.is_authenticated()
            && let Err(e) = self.inner.client.logout().await
        {
            tracing::warn!(error = %e, "Gateway logout failed; ending session locally");
        }
        self.inner.session.end(EndReason::Logout);
        self.inner.gate.on_auth_change(false).await;
    }

    // =========================================================================
    // Cross-synchronizer flows
    // =========================================================================

    /// Move a wishlist product into the cart. The product leaves the
    /// wishlist only if adding it to the cart succeeded.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn move_to_cart(&self, product_id: &ProductId) -> OpResult {
        add_breadcrumb("wishlist", "move to cart", &[("product_id", product_id.as_str())]);
        let added = self.inner.cart.add_one(product_id).await;
        if added.is_success() {
            self.inner.wishlist.remove(product_id).await;
        }
        added
    }

    /// Place an order for the current cart, then clear the cart.
    ///
    /// # Errors
    ///
    /// Returns the gateway error if the order is rejected; the cart is left
    /// untouched in that case.
    #[instrument(skip(self, request), fields(address_id = %request.address_id))]
    pub async fn place_order(&self, request: &CreateOrderRequest) -> Result<Order, GatewayError> {
        let order = self.inner.client.create_order(request).await?;
        tracing::info!(order_id = %order.id, total = %order.total_amount, "Order placed");

        let cleared = self.inner.cart.clear().await;
        if let Some(message) = cleared.message() {
            tracing::warn!(error = message, "Order placed but the cart could not be cleared");
        }
        Ok(order)
    }
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("client", &self.inner.client)
            .field("session", &self.inner.session)
            .field("cart", &self.inner.cart)
            .field("wishlist", &self.inner.wishlist)
            .finish_non_exhaustive()
    }
}
