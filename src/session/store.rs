use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::storage::{KeyValueStorage, StorageError};
use super::types::{CredentialRecord, User, UserUpdate};

/// Storage key holding the persisted credential record.
pub const STORAGE_KEY: &str = "novameet-auth";
const PERSIST_VERSION: u32 = 0;

/// Full in-memory session state. Only `record` is persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub record: CredentialRecord,
    pub is_loading: bool,
}

#[derive(Serialize, Deserialize)]
struct PersistedSession {
    state: CredentialRecord,
    #[serde(default)]
    version: u32,
}

/// Process-wide holder of the signed-in user and bearer token.
///
/// Clones are handles to the same state. Every mutation updates memory first
/// and then writes storage before returning, so a `restore()` issued right
/// after any call observes the same record. A storage failure is returned to
/// the caller; the in-memory change stays applied.
#[derive(Clone)]
pub struct CredentialStore {
    state: Arc<watch::Sender<SessionState>>,
    storage: Arc<dyn KeyValueStorage>,
}

impl CredentialStore {
    /// Creates an anonymous store. Call [`CredentialStore::restore`] to load a
    /// persisted session.
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            state: Arc::new(state),
            storage,
        }
    }

    /// Rehydrates the in-memory record from storage. No network call is made.
    ///
    /// # Errors
    /// Returns an error if storage cannot be read or holds a corrupt record;
    /// the store is left anonymous in both cases.
    pub fn restore(&self) -> Result<(), StorageError> {
        let raw = match self.storage.get(STORAGE_KEY) {
            Ok(raw) => raw,
            Err(err) => {
                self.replace(CredentialRecord::anonymous());
                return Err(err);
            }
        };

        let Some(raw) = raw else {
            debug!("no persisted session");
            self.replace(CredentialRecord::anonymous());
            return Ok(());
        };

        match serde_json::from_str::<PersistedSession>(&raw) {
            Ok(persisted) => {
                let record = persisted.state.normalized();
                info!(
                    authenticated = record.is_authenticated,
                    version = persisted.version,
                    "restored persisted session"
                );
                self.replace(record);
                Ok(())
            }
            Err(source) => {
                warn!(error = %source, "persisted session is corrupt, starting anonymous");
                self.replace(CredentialRecord::anonymous());
                Err(StorageError::Corrupt {
                    key: STORAGE_KEY.to_string(),
                    source,
                })
            }
        }
    }

    /// Stores a freshly authenticated user and token.
    ///
    /// # Errors
    /// Returns the storage error if the record cannot be persisted.
    pub fn login(&self, user: User, token: String) -> Result<(), StorageError> {
        info!(user_id = %user.id, "session started");
        let record = CredentialRecord::authenticated(user, token);
        self.state.send_modify(|state| {
            state.record = record.clone();
            state.is_loading = false;
        });
        self.persist(&record)
    }

    /// Clears the session and erases the persisted record. Idempotent.
    ///
    /// # Errors
    /// Returns the storage error if the record cannot be removed.
    pub fn logout(&self) -> Result<(), StorageError> {
        let was_authenticated = self.is_authenticated();
        self.state.send_modify(|state| {
            state.record = CredentialRecord::anonymous();
            state.is_loading = false;
        });
        if was_authenticated {
            info!("session cleared");
        } else {
            debug!("logout on an anonymous session");
        }
        self.storage.remove(STORAGE_KEY)
    }

    /// Shallow-merges `update` into the current user. Does nothing while
    /// anonymous.
    ///
    /// # Errors
    /// Returns the storage error if the updated record cannot be persisted.
    pub fn update_user(&self, update: UserUpdate) -> Result<(), StorageError> {
        if update.is_empty() {
            debug!("ignoring empty user update");
            return Ok(());
        }

        let mut updated = None;
        self.state.send_if_modified(|state| match state.record.user.as_mut() {
            Some(user) => {
                user.apply(update);
                updated = Some(state.record.clone());
                true
            }
            None => false,
        });

        match updated {
            Some(record) => {
                debug!("user profile updated");
                self.persist(&record)
            }
            None => {
                debug!("ignoring user update while anonymous");
                Ok(())
            }
        }
    }

    /// Replaces the bearer token without touching the user.
    ///
    /// # Errors
    /// Returns the storage error if the record cannot be persisted.
    pub fn set_token(&self, token: String) -> Result<(), StorageError> {
        let mut record = CredentialRecord::anonymous();
        self.state.send_modify(|state| {
            state.record.token = Some(token);
            record = state.record.clone();
        });
        debug!("bearer token replaced");
        self.persist(&record)
    }

    /// Toggles the transient loading flag. Never persisted.
    pub fn set_loading(&self, is_loading: bool) {
        self.state.send_if_modified(|state| {
            let changed = state.is_loading != is_loading;
            state.is_loading = is_loading;
            changed
        });
    }

    #[must_use]
    pub fn snapshot(&self) -> CredentialRecord {
        self.state.borrow().record.clone()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.state.borrow().record.user.clone()
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.state.borrow().record.token.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().record.is_authenticated
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    /// Change feed for the rendering layer.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    fn replace(&self, record: CredentialRecord) {
        self.state.send_modify(|state| state.record = record);
    }

    fn persist(&self, record: &CredentialRecord) -> Result<(), StorageError> {
        let payload = PersistedSession {
            state: record.clone(),
            version: PERSIST_VERSION,
        };
        let encoded = serde_json::to_string(&payload).map_err(|source| StorageError::Encode {
            key: STORAGE_KEY.to_string(),
            source,
        })?;

        self.storage.set(STORAGE_KEY, &encoded).inspect_err(|err| {
            warn!(error = %err, "failed to persist session");
        })
    }
}
