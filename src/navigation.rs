//! Navigation collaborator. The host decides what a redirect means (a browser
//! location change, a router push, or, for the CLI, a log line).

use std::sync::{Arc, Mutex, PoisonError};

use tracing::info;

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

pub trait Navigator: Send + Sync {
    /// Full navigation that discards in-app state.
    fn redirect(&self, url: &str);

    /// In-app transition.
    fn navigate(&self, path: &str);
}

/// Navigator for hosts without a view layer: every navigation is logged.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn redirect(&self, url: &str) {
        info!(target_url = url, "full-page redirect");
    }

    fn navigate(&self, path: &str) {
        info!(path, "navigate");
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Navigation {
    Redirect(String),
    Navigate(String),
}

/// Navigator that keeps every request in order, for tests and diagnostics.
#[derive(Clone, Debug, Default)]
pub struct RecordingNavigator {
    history: Arc<Mutex<Vec<Navigation>>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn history(&self) -> Vec<Navigation> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, navigation: Navigation) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(navigation);
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, url: &str) {
        self.push(Navigation::Redirect(url.to_string()));
    }

    fn navigate(&self, path: &str) {
        self.push(Navigation::Navigate(path.to_string()));
    }
}
