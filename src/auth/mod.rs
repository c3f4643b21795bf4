//! Auth endpoint wrappers on top of the gateway.

pub mod client;
pub mod types;

use thiserror::Error;

use crate::gateway::ApiError;
use crate::session::StorageError;

pub use client::AuthClient;
pub use types::{LoginResponse, RegisterResponse};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("session storage failed: {0}")]
    Storage(#[from] StorageError),
}

impl AuthError {
    /// The gateway failure, if this is one.
    #[must_use]
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            Self::Storage(_) => None,
        }
    }
}
