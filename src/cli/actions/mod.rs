pub mod session;
pub mod verify;

// Internal "interpreter" for `Action`.
mod run;

use std::sync::Arc;

use anyhow::Result;

use crate::app::App;
use crate::config::AppConfig;
use crate::navigation::TracingNavigator;
use crate::ui::{Notification, NotificationKind};

#[derive(Debug)]
pub enum Action {
    Login(session::LoginArgs),
    Logout(session::Args),
    Whoami(session::Args),
    Register(session::RegisterArgs),
    VerifyEmail(verify::Args),
    ResendVerification(verify::ResendArgs),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> Result<()> {
        run::execute(self).await
    }
}

/// App with file-backed storage and a navigator that logs.
pub(crate) fn build_app(config: AppConfig) -> Result<App> {
    App::from_config(config, Arc::new(TracingNavigator))
}

/// Writes the notification feed to stderr, oldest first.
pub(crate) fn report(app: &App) {
    for line in render_notifications(&app.ui().notifications()) {
        eprintln!("{line}");
    }
}

fn render_notifications(feed: &[Notification]) -> Vec<String> {
    feed.iter()
        .rev()
        .map(|entry| {
            let marker = match entry.kind {
                NotificationKind::Success => "ok",
                NotificationKind::Error => "error",
                NotificationKind::Warning => "warning",
                NotificationKind::Info => "info",
            };
            format!("[{marker}] {}: {}", entry.title, entry.message)
        })
        .collect()
}
