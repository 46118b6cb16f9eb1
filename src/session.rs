use std::sync::Arc;

use crate::error::StorageError;
use crate::storage::KeyValueStore;

pub const SESSION_TOKEN_KEY: &str = "userToken";

/// Persists the single opaque session token.
///
/// Unlike score writes, token operations propagate storage errors to the caller.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Overwrites any previously stored token
    pub fn set_token(&self, token: &str) -> Result<(), StorageError> {
        self.storage.set_item(SESSION_TOKEN_KEY, token)?;
        tracing::info!("session token stored");
        Ok(())
    }

    pub fn get_token(&self) -> Result<Option<String>, StorageError> {
        self.storage.get_item(SESSION_TOKEN_KEY)
    }

    pub fn clear_token(&self) -> Result<(), StorageError> {
        self.storage.remove_item(SESSION_TOKEN_KEY)?;
        tracing::info!("session token cleared");
        Ok(())
    }

    pub fn has_session(&self) -> Result<bool, StorageError> {
        Ok(self.get_token()?.is_some())
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}
