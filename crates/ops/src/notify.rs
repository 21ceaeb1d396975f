//! Transient user-facing status messages with per-kind auto-expiry.
//!
//! No timers: expiry is evaluated lazily whenever the channel is read, so a
//! dismiss or a newer push can never race a stale removal.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    pub(crate) created: Instant,
    pub(crate) duration: Duration,
}

impl Notification {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created) >= self.duration
    }
}

/// Best-effort queue of recent notifications. Expired entries are swept on
/// every access; callers only ever observe live ones.
#[derive(Debug, Clone)]
pub struct NotificationChannel {
    items: Vec<Notification>,
    success_after: Duration,
    info_after: Duration,
    error_after: Duration,
}

impl Default for NotificationChannel {
    fn default() -> Self {
        // Errors linger a little longer than good news.
        Self {
            items: Vec::new(),
            success_after: Duration::from_millis(4000),
            info_after: Duration::from_millis(4000),
            error_after: Duration::from_millis(5000),
        }
    }
}

impl NotificationChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the auto-expiry window per kind.
    pub fn with_durations(success: Duration, info: Duration, error: Duration) -> Self {
        Self {
            items: Vec::new(),
            success_after: success,
            info_after: info,
            error_after: error,
        }
    }

    pub fn push(&mut self, message: impl Into<String>, kind: NotificationKind) {
        self.sweep(Instant::now());
        let duration = match kind {
            NotificationKind::Success => self.success_after,
            NotificationKind::Info => self.info_after,
            NotificationKind::Error => self.error_after,
        };
        self.items.push(Notification {
            message: message.into(),
            kind,
            created: Instant::now(),
            duration,
        });
    }

    /// All notifications still inside their expiry window, oldest first.
    pub fn visible(&mut self) -> &[Notification] {
        self.sweep(Instant::now());
        &self.items
    }

    /// The most recent live notification, for single-slot displays.
    pub fn latest(&mut self) -> Option<&Notification> {
        self.sweep(Instant::now());
        self.items.last()
    }

    /// Remove one notification immediately. `index` refers to the swept
    /// list, i.e. what `visible()` would return right now.
    pub fn dismiss(&mut self, index: usize) {
        self.sweep(Instant::now());
        if index < self.items.len() {
            self.items.remove(index);
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn sweep(&mut self, now: Instant) {
        self.items.retain(|n| !n.is_expired(now));
    }
}
