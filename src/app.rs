//! Application root. Builds the stores once and hands out handles; nothing in
//! the crate reaches for global state.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::auth::AuthClient;
use crate::config::AppConfig;
use crate::gateway::{Gateway, GatewaySettings, ReqwestTransport, Transport};
use crate::navigation::Navigator;
use crate::session::{CredentialStore, FileStorage, KeyValueStorage};
use crate::ui::UiStore;
use crate::verification::{VerificationFlow, VerificationLink};
use crate::APP_USER_AGENT;

pub struct App {
    config: AppConfig,
    credentials: CredentialStore,
    ui: UiStore,
    gateway: Gateway,
    auth: AuthClient,
    navigator: Arc<dyn Navigator>,
}

impl App {
    /// Wires the stores together and restores any persisted session. A
    /// record that cannot be restored is logged and the app starts anonymous.
    pub fn new(
        config: AppConfig,
        storage: Arc<dyn KeyValueStorage>,
        transport: Arc<dyn Transport>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let credentials = CredentialStore::new(storage);
        if let Err(err) = credentials.restore() {
            warn!("Failed to restore session, starting anonymous: {err}");
        }

        let ui = UiStore::new();
        let gateway = Gateway::new(
            GatewaySettings::from(&config),
            transport,
            credentials.clone(),
            ui.clone(),
            navigator.clone(),
        );
        let auth = AuthClient::new(gateway.clone());

        info!(
            api_base_url = %gateway.settings().base_url,
            authenticated = credentials.is_authenticated(),
            "client ready"
        );

        Self {
            config,
            credentials,
            ui,
            gateway,
            auth,
            navigator,
        }
    }

    /// File-backed storage under `state_dir` and the `reqwest` transport.
    ///
    /// # Errors
    /// Returns an error if the API base URL does not resolve to an absolute
    /// URL or if the HTTP client cannot be built.
    pub fn from_config(config: AppConfig, navigator: Arc<dyn Navigator>) -> Result<Self> {
        config
            .resolved_base_url()
            .context("relative --api-url requires --origin")?;

        let storage = FileStorage::new(config.state_dir.clone());
        let transport =
            ReqwestTransport::new(APP_USER_AGENT).context("Failed to build HTTP client")?;
        Ok(Self::new(
            config,
            Arc::new(storage),
            Arc::new(transport),
            navigator,
        ))
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    #[must_use]
    pub fn ui(&self) -> &UiStore {
        &self.ui
    }

    #[must_use]
    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    #[must_use]
    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    #[must_use]
    pub fn navigator(&self) -> Arc<dyn Navigator> {
        self.navigator.clone()
    }

    /// Starts a verification flow for an inbound link.
    #[must_use]
    pub fn verification_flow(&self, link: VerificationLink) -> VerificationFlow {
        VerificationFlow::from_link(self.auth.clone(), self.navigator(), link)
    }
}
