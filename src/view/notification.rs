use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

/// How long a notification stays visible.
pub const AUTO_HIDE: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Success => "ok",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}

/// A transient message shown over the list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
}

impl Notification {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

/// Visible notifications, oldest first, each with its own expiry.
#[derive(Debug, Default)]
pub(crate) struct Notifications {
    entries: VecDeque<(Instant, Notification)>,
}

impl Notifications {
    pub(crate) fn push(&mut self, notification: Notification, now: Instant) {
        self.entries.push_back((now + AUTO_HIDE, notification));
    }

    /// Drops expired entries. Returns whether anything was removed.
    pub(crate) fn prune(&mut self, now: Instant) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(expires_at, _)| *expires_at > now);
        self.entries.len() != before
    }

    pub(crate) fn next_expiry(&self) -> Option<Instant> {
        self.entries.iter().map(|(expires_at, _)| *expires_at).min()
    }

    pub(crate) fn visible(&self) -> Vec<Notification> {
        self.entries.iter().map(|(_, n)| n.clone()).collect()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
