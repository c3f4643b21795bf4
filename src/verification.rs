//! Email verification flow reached from the link sent after registration.
//!
//! ```text
//! new(token) ──token──▶ Pending ──run() ok──▶ Success ──3s──▶ /dashboard
//!      │                   └────run() err──▶ Error ◀─┐
//!      └──no token────────────────────────▶ Error ───┘ resend() keeps the status
//! ```
//!
//! `Success` and `Error` are terminal. From `Error` the host can resend the
//! link or go back to the login page.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::auth::{AuthClient, AuthError};
use crate::config::normalize_value;
use crate::navigation::{Navigator, DASHBOARD_PATH, LOGIN_PATH};
use crate::session::StorageError;

/// Delay between a successful verification and the dashboard redirect.
pub const REDIRECT_DELAY: Duration = Duration::from_secs(3);
pub const RESEND_SUCCESS_TITLE: &str = "Verification email sent";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerificationStatus {
    Pending,
    Success,
    Error,
}

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("an email address is required to resend the verification link")]
    EmailRequired,
    #[error("email address looks invalid")]
    InvalidEmail,
    #[error("action not available while verification is {0:?}")]
    InvalidState(VerificationStatus),
    #[error("invalid verification link: {0}")]
    InvalidLink(#[from] url::ParseError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("session storage failed: {0}")]
    Storage(#[from] StorageError),
}

/// The inbound verification link. A link without a `token` parameter is a
/// valid link with no token.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VerificationLink {
    pub token: Option<String>,
    pub email: Option<String>,
}

impl VerificationLink {
    /// Reads `token` (and `email`, when present) from an absolute or
    /// path-relative link.
    ///
    /// # Errors
    /// Returns an error if the link cannot be parsed as a URL.
    pub fn from_url(link: &str) -> Result<Self, VerificationError> {
        let url = match Url::parse(link.trim()) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Url::parse("http://localhost/")?.join(link.trim())?
            }
            Err(err) => return Err(err.into()),
        };

        let mut parsed = Self::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "token" => parsed.token = normalize_value(&value),
                "email" => parsed.email = normalize_value(&value),
                _ => {}
            }
        }
        Ok(parsed)
    }
}

/// A one-shot in-app navigation that fires after a delay unless cancelled.
/// Dropping the guard cancels it.
#[derive(Debug)]
pub struct ScheduledRedirect {
    handle: Option<JoinHandle<()>>,
}

impl ScheduledRedirect {
    pub fn schedule(navigator: Arc<dyn Navigator>, path: &str, delay: Duration) -> Self {
        let path = path.to_string();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            navigator.navigate(&path);
        });
        Self {
            handle: Some(handle),
        }
    }

    pub fn cancel(mut self) {
        self.abort();
    }

    /// Waits for the navigation. Returns false if it was cancelled.
    pub async fn wait(mut self) -> bool {
        match self.handle.take() {
            Some(handle) => handle.await.is_ok(),
            None => false,
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    fn abort(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for ScheduledRedirect {
    fn drop(&mut self) {
        self.abort();
    }
}

pub struct VerificationFlow {
    auth: AuthClient,
    navigator: Arc<dyn Navigator>,
    token: Option<String>,
    email: Option<String>,
    status: VerificationStatus,
    started: bool,
    redirect: Option<ScheduledRedirect>,
}

impl VerificationFlow {
    /// Starts the flow. Without a token the flow is in `Error` immediately
    /// and [`VerificationFlow::run`] makes no call.
    pub fn new(
        auth: AuthClient,
        navigator: Arc<dyn Navigator>,
        token: Option<String>,
        email: Option<String>,
    ) -> Self {
        let token = token.as_deref().and_then(normalize_value);
        let status = if token.is_some() {
            VerificationStatus::Pending
        } else {
            warn!("Verification link carries no token");
            VerificationStatus::Error
        };

        Self {
            auth,
            navigator,
            token,
            email: email.as_deref().and_then(normalize_value),
            status,
            started: false,
            redirect: None,
        }
    }

    pub fn from_link(
        auth: AuthClient,
        navigator: Arc<dyn Navigator>,
        link: VerificationLink,
    ) -> Self {
        Self::new(auth, navigator, link.token, link.email)
    }

    #[must_use]
    pub fn status(&self) -> VerificationStatus {
        self.status
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn set_email(&mut self, email: &str) {
        self.email = normalize_value(email);
    }

    /// True while the dashboard redirect is scheduled and has not fired.
    #[must_use]
    pub fn redirect_pending(&self) -> bool {
        self.redirect
            .as_ref()
            .is_some_and(|redirect| !redirect.is_finished())
    }

    /// Issues the verify call once. Later calls return the current status.
    /// A failure is notified by the gateway and leaves the flow in `Error`.
    pub async fn run(&mut self) -> VerificationStatus {
        if self.started || self.status != VerificationStatus::Pending {
            return self.status;
        }
        self.started = true;

        let Some(token) = self.token.as_deref() else {
            self.status = VerificationStatus::Error;
            return self.status;
        };

        match self.auth.verify_email(token).await {
            Ok(()) => {
                info!("Email verified, redirecting in {REDIRECT_DELAY:?}");
                self.status = VerificationStatus::Success;
                self.redirect = Some(ScheduledRedirect::schedule(
                    self.navigator.clone(),
                    DASHBOARD_PATH,
                    REDIRECT_DELAY,
                ));
            }
            Err(err) => {
                debug!("verification failed: {err}");
                self.status = VerificationStatus::Error;
            }
        }
        self.status
    }

    /// Requests a new link for the known email. The status does not change.
    ///
    /// # Errors
    /// Returns [`VerificationError::EmailRequired`] or
    /// [`VerificationError::InvalidEmail`] without making a call, otherwise
    /// the gateway failure (already notified).
    pub async fn resend(&self) -> Result<(), VerificationError> {
        let email = self.email.as_deref().ok_or(VerificationError::EmailRequired)?;
        if !email.contains('@') {
            return Err(VerificationError::InvalidEmail);
        }

        self.auth.resend_verification(email).await?;
        self.auth.gateway().ui().success(
            RESEND_SUCCESS_TITLE,
            "If that email exists, a new link is on the way.",
        );
        Ok(())
    }

    /// Clears the session and goes to the login page. Only available in
    /// `Error`.
    ///
    /// # Errors
    /// Returns [`VerificationError::InvalidState`] outside `Error`, or a
    /// storage error if the session record could not be removed.
    pub fn back_to_login(&mut self) -> Result<(), VerificationError> {
        if self.status != VerificationStatus::Error {
            return Err(VerificationError::InvalidState(self.status));
        }

        self.auth.gateway().credentials().logout()?;
        self.navigator.navigate(LOGIN_PATH);
        Ok(())
    }

    /// Cancels a pending redirect. Call when the owning view goes away.
    pub fn teardown(&mut self) {
        if let Some(redirect) = self.redirect.take() {
            debug!("cancelling scheduled redirect");
            redirect.cancel();
        }
    }

    /// Waits for the scheduled redirect to fire. Returns false if none was
    /// scheduled or it was cancelled.
    pub async fn wait_for_redirect(&mut self) -> bool {
        match self.redirect.take() {
            Some(redirect) => redirect.wait().await,
            None => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::gateway::{Gateway, GatewaySettings, RawResponse, ScriptedTransport};
    use crate::navigation::{Navigation, RecordingNavigator};
    use crate::session::types::sample_user;
    use crate::session::{CredentialStore, MemoryStorage};
    use crate::ui::{NotificationKind, UiStore};
    use serde_json::json;

    struct Harness {
        auth: AuthClient,
        transport: ScriptedTransport,
        navigator: RecordingNavigator,
    }

    impl Harness {
        fn new() -> Self {
            let transport = ScriptedTransport::new();
            let navigator = RecordingNavigator::new();
            let gateway = Gateway::new(
                GatewaySettings {
                    base_url: "http://localhost/api/v1".to_string(),
                    timeout: Duration::from_secs(30),
                },
                Arc::new(transport.clone()),
                CredentialStore::new(Arc::new(MemoryStorage::new())),
                UiStore::new(),
                Arc::new(navigator.clone()),
            );
            Self {
                auth: AuthClient::new(gateway),
                transport,
                navigator,
            }
        }

        fn flow(&self, token: Option<&str>, email: Option<&str>) -> VerificationFlow {
            VerificationFlow::new(
                self.auth.clone(),
                Arc::new(self.navigator.clone()),
                token.map(str::to_string),
                email.map(str::to_string),
            )
        }
    }

    #[tokio::test]
    async fn missing_token_is_an_immediate_error_without_a_call() {
        let h = Harness::new();
        let mut flow = h.flow(None, None);
        assert_eq!(flow.status(), VerificationStatus::Error);

        assert_eq!(flow.run().await, VerificationStatus::Error);
        assert!(h.transport.requests().is_empty());

        let blank = h.flow(Some("   "), None);
        assert_eq!(blank.status(), VerificationStatus::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn success_redirects_to_dashboard_once_after_delay() {
        let h = Harness::new();
        h.transport.push_json(200, &json!({"detail": "Email verified."}));
        let mut flow = h.flow(Some("tok"), None);
        assert_eq!(flow.status(), VerificationStatus::Pending);

        assert_eq!(flow.run().await, VerificationStatus::Success);
        assert_eq!(h.transport.requests()[0].body, Some(json!({"token": "tok"})));
        assert!(flow.redirect_pending());

        tokio::time::sleep(REDIRECT_DELAY - Duration::from_millis(1)).await;
        assert!(h.navigator.history().is_empty());

        assert!(flow.wait_for_redirect().await);
        assert_eq!(
            h.navigator.history(),
            vec![Navigation::Navigate(DASHBOARD_PATH.to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_before_delay_prevents_navigation() {
        let h = Harness::new();
        h.transport.push(Ok(RawResponse::new(200, "")));
        let mut flow = h.flow(Some("tok"), None);
        flow.run().await;

        tokio::time::sleep(Duration::from_secs(1)).await;
        flow.teardown();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(h.navigator.history().is_empty());
        assert!(!flow.wait_for_redirect().await);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_flow_cancels_the_redirect() {
        let h = Harness::new();
        h.transport.push(Ok(RawResponse::new(200, "")));
        let mut flow = h.flow(Some("tok"), None);
        flow.run().await;
        drop(flow);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(h.navigator.history().is_empty());
    }

    #[tokio::test]
    async fn failure_is_terminal_and_run_is_idempotent() {
        let h = Harness::new();
        h.transport.push_json(400, &json!({"detail": "Verification link expired."}));
        let mut flow = h.flow(Some("old"), None);

        assert_eq!(flow.run().await, VerificationStatus::Error);
        assert_eq!(flow.run().await, VerificationStatus::Error);
        assert_eq!(h.transport.requests().len(), 1);
        assert!(!flow.redirect_pending());

        let feed = h.auth.gateway().ui().notifications();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].message, "Verification link expired.");
    }

    #[tokio::test]
    async fn resend_requires_a_plausible_email() {
        let h = Harness::new();
        let mut flow = h.flow(None, None);

        assert!(matches!(flow.resend().await, Err(VerificationError::EmailRequired)));
        flow.set_email("  ");
        assert!(matches!(flow.resend().await, Err(VerificationError::EmailRequired)));
        flow.set_email("not-an-email");
        assert!(matches!(flow.resend().await, Err(VerificationError::InvalidEmail)));
        assert!(h.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn resend_notifies_success_without_changing_status() {
        let h = Harness::new();
        h.transport.push(Ok(RawResponse::new(204, "")));
        let flow = h.flow(None, Some(" grace@novameet.app "));

        flow.resend().await.unwrap();

        assert_eq!(flow.status(), VerificationStatus::Error);
        assert_eq!(
            h.transport.requests()[0].body,
            Some(json!({"email": "grace@novameet.app"}))
        );
        let feed = h.auth.gateway().ui().notifications();
        assert_eq!(feed[0].kind, NotificationKind::Success);
        assert_eq!(feed[0].title, RESEND_SUCCESS_TITLE);
    }

    #[tokio::test]
    async fn resend_failure_is_notified_by_the_gateway() {
        let h = Harness::new();
        h.transport.push(Ok(RawResponse::new(500, "")));
        let flow = h.flow(None, Some("grace@novameet.app"));

        assert!(matches!(flow.resend().await, Err(VerificationError::Auth(_))));
        let feed = h.auth.gateway().ui().notifications();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].kind, NotificationKind::Error);
        assert_eq!(flow.status(), VerificationStatus::Error);
    }

    #[tokio::test]
    async fn back_to_login_only_from_error() {
        let h = Harness::new();
        h.auth
            .gateway()
            .credentials()
            .login(sample_user(), "t".to_string())
            .unwrap();

        let mut pending = h.flow(Some("tok"), None);
        assert!(matches!(
            pending.back_to_login(),
            Err(VerificationError::InvalidState(VerificationStatus::Pending))
        ));
        assert!(h.auth.gateway().credentials().is_authenticated());

        let mut failed = h.flow(None, None);
        failed.back_to_login().unwrap();
        assert!(!h.auth.gateway().credentials().is_authenticated());
        assert_eq!(
            h.navigator.history(),
            vec![Navigation::Navigate(LOGIN_PATH.to_string())]
        );
    }

    #[test]
    fn link_parsing_reads_token_and_email() {
        let link = VerificationLink::from_url(
            "https://novameet.app/verify-email?token=abc&email=ada%40novameet.app",
        )
        .unwrap();
        assert_eq!(link.token.as_deref(), Some("abc"));
        assert_eq!(link.email.as_deref(), Some("ada@novameet.app"));

        let relative = VerificationLink::from_url("/verify-email?token=xyz").unwrap();
        assert_eq!(relative.token.as_deref(), Some("xyz"));

        let bare = VerificationLink::from_url("/verify-email").unwrap();
        assert_eq!(bare, VerificationLink::default());

        let empty = VerificationLink::from_url("/verify-email?token=").unwrap();
        assert_eq!(empty.token, None);
    }

    #[test]
    fn malformed_link_is_rejected() {
        assert!(matches!(
            VerificationLink::from_url("http://[::1"),
            Err(VerificationError::InvalidLink(_))
        ));
    }
}
