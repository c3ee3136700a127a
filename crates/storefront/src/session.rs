//! Authenticated-user session.
//!
//! The session is the authentication boundary every synchronizer gates on.
//! Each transition (establish, end) bumps a monotonically increasing epoch and
//! is published on a `watch` channel; fetch results are only committed while
//! the epoch they were issued under is still current.

use std::sync::{Arc, PoisonError, RwLock};

use secrecy::SecretString;
use tokio::sync::watch;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::gateway::types::UserProfile;

/// An established session: bearer token plus the user it belongs to.
#[derive(Clone)]
pub struct AuthSession {
    token: SecretString,
    user: UserProfile,
}

impl AuthSession {
    #[must_use]
    pub fn new(token: SecretString, user: UserProfile) -> Self {
        Self { token, user }
    }

    /// The bearer token.
    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }

    /// The authenticated user.
    #[must_use]
    pub const fn user(&self) -> &UserProfile {
        &self.user
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &"[REDACTED]")
            .field("user_id", &self.user.id)
            .finish()
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The user logged out.
    Logout,
    /// The gateway answered 401; the stored credentials are no longer valid.
    Unauthorized,
}

/// What the session publishes to subscribers on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthState {
    pub authenticated: bool,
    pub epoch: u64,
    /// Set when the transition was a teardown.
    pub ended_by: Option<EndReason>,
}

/// The authentication state a fetch was issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTicket {
    pub epoch: u64,
    pub authenticated: bool,
}

#[derive(Default)]
struct SessionState {
    epoch: u64,
    current: Option<AuthSession>,
}

/// Shared session handle.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    state: RwLock<SessionState>,
    changes: watch::Sender<AuthState>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A new, unauthenticated session at epoch 0.
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = watch::channel(AuthState {
            authenticated: false,
            epoch: 0,
            ended_by: None,
        });
        Self {
            inner: Arc::new(SessionInner {
                state: RwLock::new(SessionState::default()),
                changes,
            }),
        }
    }

    /// Install a new session, replacing any existing one. Returns the new epoch.
    pub fn establish(&self, session: AuthSession) -> u64 {
        set_sentry_user(&session.user.id, Some(session.user.email.as_str()));
        let user_id = session.user.id.clone();

        let mut state = self.write();
        state.epoch += 1;
        state.current = Some(session);
        let epoch = state.epoch;
        self.inner.changes.send_replace(AuthState {
            authenticated: true,
            epoch,
            ended_by: None,
        });
        drop(state);

        tracing::info!(user_id = %user_id, epoch, "Session established");
        epoch
    }

    /// Tear the session down. Returns `false` if there was nothing to end.
    pub fn end(&self, reason: EndReason) -> bool {
        self.end_matching(None, reason)
    }

    /// Tear the session down only if it is still the one `epoch` refers to.
    ///
    /// A 401 for a request issued under an earlier session must not end the
    /// session that replaced it.
    pub fn end_if_current(&self, epoch: u64, reason: EndReason) -> bool {
        self.end_matching(Some(epoch), reason)
    }

    fn end_matching(&self, expected_epoch: Option<u64>, reason: EndReason) -> bool {
        let mut state = self.write();
        if expected_epoch.is_some_and(|epoch| epoch != state.epoch) {
            return false;
        }
        if state.current.take().is_none() {
            return false;
        }
        state.epoch += 1;
        let epoch = state.epoch;
        self.inner.changes.send_replace(AuthState {
            authenticated: false,
            epoch,
            ended_by: Some(reason),
        });
        drop(state);

        clear_sentry_user();
        tracing::info!(?reason, epoch, "Session ended");
        true
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read().current.is_some()
    }

    /// Current epoch.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.read().epoch
    }

    /// Capture the authentication state at call time.
    #[must_use]
    pub fn ticket(&self) -> SessionTicket {
        let state = self.read();
        SessionTicket {
            epoch: state.epoch,
            authenticated: state.current.is_some(),
        }
    }

    /// Whether no transition has happened since `ticket` was taken.
    #[must_use]
    pub fn is_current(&self, ticket: SessionTicket) -> bool {
        self.ticket() == ticket
    }

    /// Bearer token and the epoch it belongs to.
    #[must_use]
    pub fn credentials(&self) -> (u64, Option<SecretString>) {
        let state = self.read();
        (
            state.epoch,
            state.current.as_ref().map(|s| s.token.clone()),
        )
    }

    /// The authenticated user, if any.
    #[must_use]
    pub fn user(&self) -> Option<UserProfile> {
        self.read().current.as_ref().map(|s| s.user.clone())
    }

    /// Subscribe to session transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.changes.subscribe()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, SessionState> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, SessionState> {
        self.inner.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("Session")
            .field("epoch", &state.epoch)
            .field("current", &state.current)
            .finish()
    }
}
