//! User-visible notifications.
//!
//! Wishlist operations announce their outcome themselves; cart operations
//! return an [`OpResult`](crate::sync::OpResult) and leave notifying to the
//! caller. Front ends plug in their own [`Notifier`] (toasts, stderr, ...).

use std::sync::{Arc, Mutex, PoisonError};

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A message meant for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// Sink for user-visible notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Default notifier: writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => tracing::info!(target: "notify", "{}", notification.message),
            NotificationLevel::Error => tracing::warn!(target: "notify", "{}", notification.message),
        }
    }
}

/// Notifier that keeps every notification, for front ends that render them
/// in batches and for tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    seen: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything notified so far, oldest first.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return everything notified so far.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.seen.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_notifier_keeps_order() {
        let notifier = RecordingNotifier::new();
        notifier.notify(Notification::success("Item added to wishlist"));
        notifier.notify(Notification::error("Failed to remove from wishlist"));

        let seen = notifier.notifications();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].level, NotificationLevel::Success);
        assert_eq!(seen[1].message, "Failed to remove from wishlist");

        assert_eq!(notifier.drain().len(), 2);
        assert!(notifier.notifications().is_empty());
    }

    #[test]
    fn test_clones_share_storage() {
        let notifier = RecordingNotifier::new();
        let clone = notifier.clone();
        clone.notify(Notification::success("Wishlist cleared"));
        assert_eq!(notifier.notifications().len(), 1);
    }
}
