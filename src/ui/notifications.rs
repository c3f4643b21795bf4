//! Notification feed entries. The feed is newest-first and never holds more
//! than [`MAX_NOTIFICATIONS`] entries; messages must be safe to render and
//! must never include secrets or tokens.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use ulid::Ulid;

pub const MAX_NOTIFICATIONS: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        };
        f.write_str(label)
    }
}

/// A notification as raised by a component, before the feed assigns its
/// identity and timestamp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewNotification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl NewNotification {
    pub fn new(
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    /// Monotonic and time-ordered.
    pub id: Ulid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

impl Notification {
    pub(crate) fn from_new(id: Ulid, created_at: DateTime<Utc>, entry: NewNotification) -> Self {
        Self {
            id,
            kind: entry.kind,
            title: entry.title,
            message: entry.message,
            created_at,
            read: false,
        }
    }
}

/// Prepends `entry` and drops everything past the most recent 50.
pub(crate) fn push_bounded(feed: &mut VecDeque<Notification>, entry: Notification) {
    feed.push_front(entry);
    feed.truncate(MAX_NOTIFICATIONS);
}

/// Returns true if an unread entry with `id` was found and flipped.
pub(crate) fn mark_read(feed: &mut VecDeque<Notification>, id: Ulid) -> bool {
    match feed.iter_mut().find(|entry| entry.id == id) {
        Some(entry) if !entry.read => {
            entry.read = true;
            true
        }
        _ => false,
    }
}
