//! Startup configuration for the gateway and the credential storage location.
//! The CLI fills it from flags and `NOVAMEET_*` variables; anything unset keeps
//! the defaults below. Configuration values are public; do not store secrets
//! here.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use url::Url;

/// Base path used when no API base URL is configured.
pub const DEFAULT_API_BASE_URL: &str = "/api/v1";
/// Timeout budget applied to every gateway call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Directory (relative to the working directory) holding persisted state.
pub const DEFAULT_STATE_DIR: &str = ".novameet";

/// Client configuration resolved once at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub api_base_url: String,
    /// Absolute origin joined in front of a relative `api_base_url`.
    pub origin: Option<String>,
    pub timeout: Duration,
    pub state_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            origin: None,
            timeout: DEFAULT_TIMEOUT,
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
        }
    }
}

impl AppConfig {
    /// Resolves the absolute base URL requests are sent to.
    ///
    /// # Errors
    /// Returns an error if the base is relative and no origin is configured,
    /// or if the resulting URL does not parse.
    pub fn resolved_base_url(&self) -> Result<Url> {
        let base = self.api_base_url.trim();
        if base.starts_with("http://") || base.starts_with("https://") {
            return Ok(Url::parse(base)?);
        }

        let origin = self
            .origin
            .as_deref()
            .and_then(normalize_value)
            .ok_or_else(|| {
                anyhow!("API base URL '{base}' is relative and no origin is configured")
            })?;

        Ok(Url::parse(&build_url_with_base(&origin, base))?)
    }
}

/// Trims a configuration value and rejects blanks.
#[must_use]
pub fn normalize_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Joins a base URL and a path with exactly one slash between them.
#[must_use]
pub fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}
