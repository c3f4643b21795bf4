//! Request and response payloads for the auth endpoints. Passwords and tokens
//! travel in these types, so their `Debug` output is redacted.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};

use crate::session::User;

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    #[serde(serialize_with = "expose_secret")]
    pub password: SecretString,
}

#[derive(Clone, Deserialize)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("user", &self.user)
            .field("token", &"[redacted]")
            .finish()
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    #[serde(serialize_with = "expose_secret")]
    pub password: SecretString,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RegisterResponse {
    pub user: User,
    /// Server hint, usually "check your inbox".
    #[serde(default)]
    pub detail: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerifyEmailRequest {
    pub token: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResendVerificationRequest {
    pub email: String,
}

fn expose_secret<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}
