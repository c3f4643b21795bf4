//! Identity and credential types held by the credential store. The token is
//! a bearer secret, so `Debug` output never includes it.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    #[default]
    Active,
    Pending,
    Suspended,
    Deactivated,
    #[serde(other)]
    Unknown,
}

/// Snapshot of the signed-in user as returned by the profile endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub phone_verified: bool,
    #[serde(default)]
    pub roles: BTreeSet<String>,
    #[serde(default)]
    pub account_status: AccountStatus,
}

impl User {
    /// Display name, falling back to the email when no name is set.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_string()
        }
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// Shallow merge: every field present in `update` replaces the current one.
    pub fn apply(&mut self, update: UserUpdate) {
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(first_name) = update.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            self.last_name = last_name;
        }
        if let Some(email_verified) = update.email_verified {
            self.email_verified = email_verified;
        }
        if let Some(phone_verified) = update.phone_verified {
            self.phone_verified = phone_verified;
        }
        if let Some(roles) = update.roles {
            self.roles = roles;
        }
        if let Some(account_status) = update.account_status {
            self.account_status = account_status;
        }
    }
}

/// Partial user used for profile updates. `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<BTreeSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_status: Option<AccountStatus>,
}

impl UserUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A full profile as an update, so a refreshed profile merges over the held one.
impl From<User> for UserUpdate {
    fn from(user: User) -> Self {
        Self {
            email: Some(user.email),
            first_name: Some(user.first_name),
            last_name: Some(user.last_name),
            email_verified: Some(user.email_verified),
            phone_verified: Some(user.phone_verified),
            roles: Some(user.roles),
            account_status: Some(user.account_status),
        }
    }
}

/// The persisted subset of the credential store.
///
/// `is_authenticated` is derived from `user`; the constructors keep it in
/// sync and [`CredentialRecord::normalized`] repairs records read from disk.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub is_authenticated: bool,
}

impl CredentialRecord {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn authenticated(user: User, token: String) -> Self {
        Self {
            user: Some(user),
            token: Some(token),
            is_authenticated: true,
        }
    }

    /// Re-derives `is_authenticated` from the presence of a user.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.is_authenticated = self.user.is_some();
        self
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("user", &self.user)
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .field("is_authenticated", &self.is_authenticated)
            .finish()
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}

#[cfg(test)]
pub(crate) fn sample_user() -> User {
    User {
        id: "42".to_string(),
        email: "ada@novameet.app".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email_verified: true,
        phone_verified: false,
        roles: BTreeSet::from(["host".to_string()]),
        account_status: AccountStatus::Active,
    }
}
