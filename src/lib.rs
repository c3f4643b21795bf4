//! # NovaMeet session & gateway client
//!
//! `novameet` is the client-side session layer of the NovaMeet scheduling
//! dashboard. Every page of the dashboard talks to the API through this crate:
//!
//! 1. **Credential store** ([`session`]): the current user and bearer token,
//!    persisted under a single `novameet-auth` record so a session survives
//!    restarts.
//! 2. **Request gateway** ([`gateway`]): the one chokepoint for outbound calls.
//!    It attaches `Authorization: Token <token>`, classifies failures with an
//!    ordered first-match-wins rule table and runs the side effects of each
//!    classification (session clear on 401, user-facing notifications).
//! 3. **UI signal store** ([`ui`]): sidebar chrome and a bounded notification
//!    feed. Not persisted.
//! 4. **Verification flow** ([`verification`]): the email-confirmation state
//!    machine reached from the link sent after registration.
//!
//! The stores are plain constructed values owned by [`app::App`] and handed to
//! consumers; there is no ambient global state. Collaborators the layer needs
//! from its host (storage, navigation, transport) are traits so tests can swap
//! them for in-memory fakes.

pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod gateway;
pub mod navigation;
pub mod session;
pub mod ui;
pub mod verification;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub(crate) mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

pub(crate) const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub use app::App;
pub use auth::{AuthClient, AuthError};
pub use config::AppConfig;
pub use gateway::{ApiError, Gateway, RequestOptions};
pub use navigation::Navigator;
pub use session::{CredentialRecord, CredentialStore, User};
pub use ui::{NotificationKind, UiStore};
pub use verification::{VerificationFlow, VerificationStatus};
