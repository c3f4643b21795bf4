//! Typed wrappers for the auth endpoints. Every call goes through the
//! gateway, so failures are already classified and notified by the time they
//! reach the caller; these helpers only keep the credential store in step.

use secrecy::SecretString;
use serde_json::Value;
use tracing::{debug, info};

use super::types::{
    LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, ResendVerificationRequest,
    VerifyEmailRequest,
};
use super::AuthError;
use crate::gateway::{Gateway, RequestOptions, NO_BODY};
use crate::session::{CredentialStore, User, UserUpdate};

pub const LOGIN_ENDPOINT: &str = "/auth/login/";
pub const REGISTER_ENDPOINT: &str = "/auth/register/";
pub const LOGOUT_ENDPOINT: &str = "/auth/logout/";
pub const PROFILE_ENDPOINT: &str = "/auth/me/";
pub const VERIFY_EMAIL_ENDPOINT: &str = "/auth/verify-email/";
pub const RESEND_VERIFICATION_ENDPOINT: &str = "/auth/resend-verification/";

#[derive(Clone)]
pub struct AuthClient {
    gateway: Gateway,
}

impl AuthClient {
    #[must_use]
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    #[must_use]
    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    fn credentials(&self) -> &CredentialStore {
        self.gateway.credentials()
    }

    /// Exchanges email and password for a token and starts a session.
    ///
    /// # Errors
    /// Returns the gateway failure, or a storage error if the new session
    /// could not be persisted (it is still active in memory).
    pub async fn login(&self, email: &str, password: SecretString) -> Result<User, AuthError> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password,
        };

        self.credentials().set_loading(true);
        let response: LoginResponse = self
            .gateway
            .post(LOGIN_ENDPOINT, Some(&request), RequestOptions::new())
            .await
            .inspect_err(|_| self.credentials().set_loading(false))?;

        let LoginResponse { user, token } = response;
        self.credentials().login(user.clone(), token)?;
        Ok(user)
    }

    /// Creates an account. No session is started; the account has to be
    /// verified first.
    ///
    /// # Errors
    /// Returns the gateway failure.
    pub async fn register(
        &self,
        email: &str,
        password: SecretString,
        first_name: &str,
        last_name: &str,
    ) -> Result<RegisterResponse, AuthError> {
        let request = RegisterRequest {
            email: email.trim().to_string(),
            password,
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
        };

        let response: RegisterResponse = self
            .gateway
            .post(REGISTER_ENDPOINT, Some(&request), RequestOptions::new())
            .await?;
        info!(user_id = %response.user.id, "account registered");
        Ok(response)
    }

    /// Ends the session. The server call is best effort; the local session
    /// is cleared regardless of its outcome.
    ///
    /// # Errors
    /// Returns a storage error if the persisted record could not be removed.
    pub async fn logout(&self) -> Result<(), AuthError> {
        if self.credentials().token().is_some() {
            let result: Result<Value, _> = self
                .gateway
                .post(LOGOUT_ENDPOINT, NO_BODY, RequestOptions::new())
                .await;
            if let Err(err) = result {
                debug!("server logout failed: {err}");
            }
        }

        self.credentials().logout()?;
        Ok(())
    }

    /// Fetches the current profile and merges it into the held user.
    ///
    /// # Errors
    /// Returns [`crate::ApiError::MissingToken`] when anonymous, otherwise the
    /// gateway failure or a storage error.
    pub async fn fetch_profile(&self) -> Result<User, AuthError> {
        let user: User = self
            .gateway
            .get(PROFILE_ENDPOINT, RequestOptions::authenticated())
            .await?;
        self.credentials().update_user(UserUpdate::from(user.clone()))?;
        Ok(user)
    }

    /// # Errors
    /// Returns [`crate::ApiError::MissingToken`] when anonymous, otherwise the
    /// gateway failure or a storage error.
    pub async fn update_profile(&self, update: &UserUpdate) -> Result<User, AuthError> {
        let user: User = self
            .gateway
            .patch(PROFILE_ENDPOINT, Some(update), RequestOptions::authenticated())
            .await?;
        self.credentials().update_user(UserUpdate::from(user.clone()))?;
        Ok(user)
    }

    /// Confirms the address behind a verification link. The token is never
    /// logged.
    ///
    /// # Errors
    /// Returns the gateway failure.
    pub async fn verify_email(&self, token: &str) -> Result<(), AuthError> {
        let request = VerifyEmailRequest {
            token: token.to_string(),
        };
        let _: Value = self
            .gateway
            .post(VERIFY_EMAIL_ENDPOINT, Some(&request), RequestOptions::new())
            .await?;
        info!("email verified");
        Ok(())
    }

    /// # Errors
    /// Returns the gateway failure.
    pub async fn resend_verification(&self, email: &str) -> Result<(), AuthError> {
        let request = ResendVerificationRequest {
            email: email.to_string(),
        };
        let _: Value = self
            .gateway
            .post(
                RESEND_VERIFICATION_ENDPOINT,
                Some(&request),
                RequestOptions::new(),
            )
            .await?;
        debug!("verification email requested");
        Ok(())
    }
}
