//! User-facing notifications.
//!
//! Every user action produces at most one notification. The pipeline queues
//! them; the front end drains the queue and shows them however it likes.

use serde::Serialize;
use std::fmt;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Informational, nothing changed
    Info,
    /// Action completed
    Success,
    /// Action completed with something worth attention
    Warning,
    /// Action failed
    Error,
}

/// A transient, user-visible message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Severity
    pub level: Level,
    /// Short headline
    pub title: String,
    /// Longer description
    pub message: String,
}

impl Notification {
    /// Creates a notification.
    #[must_use]
    pub fn new(level: Level, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
        }
    }

    /// True for [`Level::Error`].
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.level, Level::Error)
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            Level::Info => "info",
            Level::Success => "ok",
            Level::Warning => "warn",
            Level::Error => "error",
        };
        write!(f, "[{tag}] {}: {}", self.title, self.message)
    }
}
