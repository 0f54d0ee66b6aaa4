use parking_lot::Mutex;
use tracing::debug;

use crate::item::RepIdentity;

/// Event emitted by the compiler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A representation reused its cached content instead of recompiling
    CachedContentUsed { rep: RepIdentity },
}

impl Notification {
    pub fn name(&self) -> &'static str {
        match self {
            Notification::CachedContentUsed { .. } => "cached_content_used",
        }
    }

    pub fn rep(&self) -> &RepIdentity {
        match self {
            Notification::CachedContentUsed { rep } => rep,
        }
    }
}

/// Trait for receiving notifications
/// Injected into the phases that post events, so tests can substitute a collector
pub trait NotificationSink: Send + Sync {
    fn post(&self, notification: Notification);
}

/// Notification sink that forwards every event to the tracing subscriber
#[derive(Debug, Default)]
pub struct TracingNotificationSink;

impl TracingNotificationSink {
    pub fn new() -> Self {
        Self
    }
}

impl NotificationSink for TracingNotificationSink {
    fn post(&self, notification: Notification) {
        debug!(event = notification.name(), rep = %notification.rep(), "notification");
    }
}

/// Collecting notification sink for testing
/// Collects all notifications without emitting them
#[derive(Debug, Default)]
pub struct CollectingNotificationSink {
    notifications: Mutex<Vec<Notification>>,
}

impl CollectingNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_notifications(&self) -> Vec<Notification> {
        self.notifications.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.notifications.lock().len()
    }
}

impl NotificationSink for CollectingNotificationSink {
    fn post(&self, notification: Notification) {
        self.notifications.lock().push(notification);
    }
}
