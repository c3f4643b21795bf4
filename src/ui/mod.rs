//! UI signal store: navigation chrome plus the notification feed. Everything
//! here is ephemeral and lives only as long as the process.

pub mod chrome;
pub mod notifications;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use ulid::{Generator, Ulid};

pub use chrome::{is_mobile_width, ChromeState, MOBILE_BREAKPOINT_PX};
pub use notifications::{NewNotification, Notification, NotificationKind, MAX_NOTIFICATIONS};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UiState {
    pub chrome: ChromeState,
    /// Newest first.
    pub notifications: VecDeque<Notification>,
}

/// Handle to the UI signal store. Clones share state.
#[derive(Clone)]
pub struct UiStore {
    state: Arc<watch::Sender<UiState>>,
    ids: Arc<Mutex<Generator>>,
}

impl Default for UiStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UiStore {
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(UiState::default());
        Self {
            state: Arc::new(state),
            ids: Arc::new(Mutex::new(Generator::new())),
        }
    }

    /// Flips `sidebar_open` on mobile and `sidebar_collapsed` otherwise,
    /// judged against the viewport classification at call time.
    pub fn toggle_sidebar(&self) {
        self.state.send_modify(|state| state.chrome.toggle_sidebar());
    }

    pub fn set_sidebar_open(&self, open: bool) {
        self.update_chrome(|chrome| chrome.sidebar_open = open);
    }

    pub fn set_sidebar_collapsed(&self, collapsed: bool) {
        self.update_chrome(|chrome| chrome.sidebar_collapsed = collapsed);
    }

    /// Viewport classification is pushed in by the host's resize observer.
    pub fn set_is_mobile(&self, is_mobile: bool) {
        self.update_chrome(|chrome| chrome.is_mobile = is_mobile);
    }

    pub fn set_viewport_width(&self, width_px: u32) {
        self.set_is_mobile(is_mobile_width(width_px));
    }

    pub fn set_global_loading(&self, loading: bool) {
        self.update_chrome(|chrome| chrome.global_loading = loading);
    }

    pub fn set_dark_mode(&self, dark_mode: bool) {
        self.update_chrome(|chrome| chrome.dark_mode = dark_mode);
    }

    pub fn toggle_dark_mode(&self) {
        self.state.send_modify(|state| state.chrome.dark_mode = !state.chrome.dark_mode);
    }

    /// Adds a notification at the head of the feed and returns its id.
    pub fn add_notification(&self, entry: NewNotification) -> Ulid {
        let id = self.next_id();
        log_notification(&entry);
        let notification = Notification::from_new(id, Utc::now(), entry);
        self.state.send_modify(|state| {
            notifications::push_bounded(&mut state.notifications, notification);
        });
        id
    }

    pub fn success(&self, title: impl Into<String>, message: impl Into<String>) -> Ulid {
        self.add_notification(NewNotification::new(NotificationKind::Success, title, message))
    }

    pub fn error(&self, title: impl Into<String>, message: impl Into<String>) -> Ulid {
        self.add_notification(NewNotification::new(NotificationKind::Error, title, message))
    }

    pub fn warning(&self, title: impl Into<String>, message: impl Into<String>) -> Ulid {
        self.add_notification(NewNotification::new(NotificationKind::Warning, title, message))
    }

    pub fn info(&self, title: impl Into<String>, message: impl Into<String>) -> Ulid {
        self.add_notification(NewNotification::new(NotificationKind::Info, title, message))
    }

    /// Marks the entry read; unknown ids are ignored.
    pub fn mark_notification_read(&self, id: Ulid) {
        self.state.send_if_modified(|state| notifications::mark_read(&mut state.notifications, id));
    }

    pub fn clear_notifications(&self) {
        self.state.send_modify(|state| state.notifications.clear());
    }

    #[must_use]
    pub fn chrome(&self) -> ChromeState {
        self.state.borrow().chrome
    }

    /// Newest first.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.state.borrow().notifications.iter().cloned().collect()
    }

    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.state
            .borrow()
            .notifications
            .iter()
            .filter(|entry| !entry.read)
            .count()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<UiState> {
        self.state.subscribe()
    }

    fn update_chrome(&self, apply: impl FnOnce(&mut ChromeState)) {
        self.state.send_if_modified(|state| {
            let before = state.chrome;
            apply(&mut state.chrome);
            before != state.chrome
        });
    }

    fn next_id(&self) -> Ulid {
        let mut ids = self.ids.lock().unwrap_or_else(PoisonError::into_inner);
        // Only fails once 2^80 ids were drawn within one millisecond.
        ids.generate().unwrap_or_else(|_| Ulid::new())
    }
}

fn log_notification(entry: &NewNotification) {
    let NewNotification {
        kind,
        title,
        message,
    } = entry;
    match kind {
        NotificationKind::Error => error!(%title, %message, "notification"),
        NotificationKind::Warning => warn!(%title, %message, "notification"),
        NotificationKind::Success | NotificationKind::Info => {
            info!(%title, %message, "notification");
        }
    }
    debug!(%kind, "notification queued");
}
