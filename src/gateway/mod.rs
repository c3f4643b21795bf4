//! The request gateway: every outbound API call goes through [`Gateway`].
//!
//! Outbound, the gateway resolves the URL against the configured base,
//! applies the timeout budget and attaches `Authorization: Token <token>`
//! when the credential store holds one. Inbound, a 2xx body is decoded and
//! returned unchanged; anything else is classified by [`classify::classify`]
//! and its side effects run before the error reaches the caller:
//!
//! - 401 clears the credential store, then redirects to `/login`. No
//!   notification is raised.
//! - every other classified failure raises one error notification per
//!   message from [`ApiError::messages`].
//!
//! The gateway never retries.

pub mod classify;
pub mod error;
pub mod transport;

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info_span, warn, Instrument};

use crate::config::{build_url_with_base, AppConfig};
use crate::navigation::{Navigator, LOGIN_PATH};
use crate::session::CredentialStore;
use crate::ui::UiStore;

pub use classify::{classify, FailedResponse};
pub use error::{ApiError, FieldErrors};
pub use transport::{
    ApiRequest, Method, RawResponse, ReqwestTransport, ScriptedTransport, Transport, TransportError,
};

/// Title used for every notification the gateway raises.
pub const ERROR_TITLE: &str = "Error";

/// Body argument for verbs called without a payload.
pub const NO_BODY: Option<&Value> = None;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewaySettings {
    pub base_url: String,
    pub timeout: Duration,
}

impl From<&AppConfig> for GatewaySettings {
    fn from(config: &AppConfig) -> Self {
        // A relative base without an origin is kept as-is; the transport
        // reports it per call.
        let base_url = config.resolved_base_url().map_or_else(
            |err| {
                warn!("Using unresolved API base URL: {err}");
                config.api_base_url.clone()
            },
            |url| url.to_string(),
        );

        Self {
            base_url,
            timeout: config.timeout,
        }
    }
}

/// Per-call knobs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    /// Replaces the configured timeout for this call.
    pub timeout: Option<Duration>,
    /// Fail with [`ApiError::MissingToken`] before any I/O when no token is held.
    pub require_auth: bool,
}

impl RequestOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn authenticated() -> Self {
        Self {
            require_auth: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

struct GatewayInner {
    settings: GatewaySettings,
    transport: Arc<dyn Transport>,
    credentials: CredentialStore,
    ui: UiStore,
    navigator: Arc<dyn Navigator>,
}

/// Handle to the request pipeline. Clones share the same stores.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

impl Gateway {
    pub fn new(
        settings: GatewaySettings,
        transport: Arc<dyn Transport>,
        credentials: CredentialStore,
        ui: UiStore,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            inner: Arc::new(GatewayInner {
                settings,
                transport,
                credentials,
                ui,
                navigator,
            }),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &GatewaySettings {
        &self.inner.settings
    }

    #[must_use]
    pub fn credentials(&self) -> &CredentialStore {
        &self.inner.credentials
    }

    #[must_use]
    pub fn ui(&self) -> &UiStore {
        &self.inner.ui
    }

    /// # Errors
    /// Returns the classified failure after its side effects have run.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        self.request(Method::Get, path, None, options).await
    }

    /// # Errors
    /// Returns the classified failure after its side effects have run.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        self.request(Method::Delete, path, None, options).await
    }

    /// # Errors
    /// Returns [`ApiError::Encode`] if `body` cannot be serialized, otherwise
    /// the classified failure after its side effects have run.
    pub async fn post<B, T>(
        &self,
        path: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = encode(body)?;
        self.request(Method::Post, path, body, options).await
    }

    /// # Errors
    /// Returns [`ApiError::Encode`] if `body` cannot be serialized, otherwise
    /// the classified failure after its side effects have run.
    pub async fn put<B, T>(
        &self,
        path: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = encode(body)?;
        self.request(Method::Put, path, body, options).await
    }

    /// # Errors
    /// Returns [`ApiError::Encode`] if `body` cannot be serialized, otherwise
    /// the classified failure after its side effects have run.
    pub async fn patch<B, T>(
        &self,
        path: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = encode(body)?;
        self.request(Method::Patch, path, body, options).await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let span = info_span!("gateway.request", http.method = %method, path);
        self.dispatch(method, path, body, options)
            .instrument(span)
            .await
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let request = self.outbound(method, path, body, options)?;

        let response = match self.inner.transport.send(request).await {
            Ok(response) => response,
            Err(err) => {
                warn!("Transport failure: {err}");
                return Err(ApiError::Transport {
                    status: None,
                    message: err.to_string(),
                });
            }
        };

        if response.is_success() {
            debug!(status = response.status, "request succeeded");
            return decode(&response);
        }

        let failure = classify(&FailedResponse::from_raw(response.status, &response.body));
        self.apply_side_effects(&failure);
        Err(failure)
    }

    fn outbound(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> Result<ApiRequest, ApiError> {
        let RequestOptions {
            headers: extra_headers,
            query,
            timeout,
            require_auth,
        } = options;

        let token = self.inner.credentials.token();
        if require_auth && token.is_none() {
            debug!("refusing authenticated request without a token");
            return Err(ApiError::MissingToken);
        }

        let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
        if body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        if let Some(token) = token {
            headers.push(("Authorization".to_string(), format!("Token {token}")));
        }
        for (name, value) in extra_headers {
            headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
            headers.push((name, value));
        }

        Ok(ApiRequest {
            method,
            url: build_url_with_base(&self.inner.settings.base_url, path),
            headers,
            query,
            body,
            timeout: timeout.unwrap_or(self.inner.settings.timeout),
        })
    }

    fn apply_side_effects(&self, failure: &ApiError) {
        if failure.is_session_expired() {
            warn!("Session expired, clearing credentials");
            // The clear must land before the caller sees the failure.
            if let Err(err) = self.inner.credentials.logout() {
                error!("Failed to remove persisted credentials: {err}");
            }
            self.inner.navigator.redirect(LOGIN_PATH);
            return;
        }

        let messages = failure.messages();
        if messages.is_empty() {
            debug!(status = ?failure.status(), "Unclassified failure, no notification: {failure}");
        }
        for message in messages {
            self.inner.ui.error(ERROR_TITLE, message);
        }
    }
}

fn encode<B: Serialize + ?Sized>(body: Option<&B>) -> Result<Option<Value>, ApiError> {
    body.map(serde_json::to_value)
        .transpose()
        .map_err(|err| ApiError::Encode(err.to_string()))
}

fn decode<T: DeserializeOwned>(response: &RawResponse) -> Result<T, ApiError> {
    let decoded = if response.body.trim().is_empty() {
        serde_json::from_value(Value::Null)
    } else {
        serde_json::from_str(&response.body)
    };

    decoded.map_err(|err| {
        warn!(status = response.status, "Undecodable success body: {err}");
        ApiError::Transport {
            status: Some(response.status),
            message: format!("invalid response body: {err}"),
        }
    })
}
