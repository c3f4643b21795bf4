//! Credential store: the signed-in user, the bearer token and their
//! persistence. The gateway reads the token from here on every call and
//! clears it when the server rejects the session.

pub mod storage;
mod store;
pub mod types;

pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};
pub use store::{CredentialStore, SessionState, STORAGE_KEY};
pub use types::{AccountStatus, CredentialRecord, User, UserUpdate};
