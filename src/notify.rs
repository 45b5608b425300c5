//! Notification Surface
//!
//! Ephemeral user-visible messages. Each notification lives for a fixed
//! time-to-live and is then dismissed automatically; every message is also
//! mirrored to the log.

use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationLevel {
    /// Prefix shown in the terminal
    pub fn icon(&self) -> &'static str {
        match self {
            NotificationLevel::Info => "ℹ",
            NotificationLevel::Success => "✓",
            NotificationLevel::Warning => "⚠",
            NotificationLevel::Error => "✕",
        }
    }
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NotificationLevel::Info => "info",
            NotificationLevel::Success => "success",
            NotificationLevel::Warning => "warning",
            NotificationLevel::Error => "error",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub level: NotificationLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.level.icon(), self.message)
    }
}

/// Shared handle to the notification queue
#[derive(Debug, Clone)]
pub struct Notifier {
    inner: Arc<Mutex<Vec<Notification>>>,
    /// `None` when the configured TTL does not fit a `chrono::Duration`
    ttl: Option<Duration>,
}

impl Notifier {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Vec::new())),
            ttl: Duration::from_std(ttl).ok(),
        }
    }

    /// Post a notification, returning its id
    pub fn notify(&self, level: NotificationLevel, message: impl Into<String>) -> Uuid {
        let message = message.into();

        match level {
            NotificationLevel::Error => tracing::error!("{}", message),
            NotificationLevel::Warning => tracing::warn!("{}", message),
            _ => tracing::info!("{}", message),
        }

        let notification = Notification {
            id: Uuid::new_v4(),
            level,
            message,
            created_at: Utc::now(),
        };
        let id = notification.id;
        self.lock().push(notification);
        id
    }

    pub fn info(&self, message: impl Into<String>) -> Uuid {
        self.notify(NotificationLevel::Info, message)
    }

    pub fn success(&self, message: impl Into<String>) -> Uuid {
        self.notify(NotificationLevel::Success, message)
    }

    pub fn warning(&self, message: impl Into<String>) -> Uuid {
        self.notify(NotificationLevel::Warning, message)
    }

    pub fn error(&self, message: impl Into<String>) -> Uuid {
        self.notify(NotificationLevel::Error, message)
    }

    /// Notifications still visible at `now`
    pub fn active(&self, now: DateTime<Utc>) -> Vec<Notification> {
        self.lock()
            .iter()
            .filter(|n| self.is_live(n, now))
            .cloned()
            .collect()
    }

    /// Drop expired notifications, returning how many were removed
    pub fn prune(&self, now: DateTime<Utc>) -> usize {
        let mut queue = self.lock();
        let before = queue.len();
        queue.retain(|n| self.is_live(n, now));
        before - queue.len()
    }

    /// Close one notification early
    pub fn dismiss(&self, id: Uuid) -> bool {
        let mut queue = self.lock();
        let before = queue.len();
        queue.retain(|n| n.id != id);
        queue.len() < before
    }

    /// Take every queued notification
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.lock())
    }

    pub fn count(&self, level: NotificationLevel) -> usize {
        self.lock().iter().filter(|n| n.level == level).count()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// An expiry past the representable calendar never comes
    fn is_live(&self, notification: &Notification, now: DateTime<Utc>) -> bool {
        match self.ttl {
            Some(ttl) => notification
                .created_at
                .checked_add_signed(ttl)
                .map_or(true, |expires| expires > now),
            None => true,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notification>> {
        // A panic while holding the lock leaves the queue itself intact
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(std::time::Duration::from_secs(5))
    }
}
