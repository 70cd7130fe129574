//! Session token persistence.
//!
//! A session is one opaque token stored under [`keys::SESSION_TOKEN`].
//! Presence of the token is the whole of "being logged in"; the token is
//! not a verifiable credential.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::storage::{KvStore, KvStoreExt, StorageError, keys};

pub const TOKEN_PREFIX: &str = "mock-jwt-token-";

/// Build a session token from a creation instant.
#[must_use]
pub fn generate_token(now: DateTime<Utc>) -> String {
    format!("{TOKEN_PREFIX}{}", now.timestamp_millis())
}

#[derive(Clone)]
pub struct SessionStore {
    kv: Arc<dyn KvStore>,
}

impl SessionStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Current token, if a session exists.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the token cannot be read.
    pub fn token(&self) -> Result<Option<String>, StorageError> {
        let token: Option<String> = self.kv.get_json(keys::SESSION_TOKEN)?;
        Ok(token.filter(|t| !t.is_empty()))
    }

    /// # Errors
    ///
    /// Returns [`StorageError`] if the token cannot be read.
    pub fn is_present(&self) -> Result<bool, StorageError> {
        Ok(self.token()?.is_some())
    }

    /// Write a fresh token, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the token cannot be written.
    pub fn start(&self) -> Result<String, StorageError> {
        let token = generate_token(Utc::now());
        self.kv.set_json(keys::SESSION_TOKEN, &token)?;
        Ok(token)
    }

    /// # Errors
    ///
    /// Returns [`StorageError`] if the token cannot be removed.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.kv.remove(keys::SESSION_TOKEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKv;
    use chrono::TimeZone;

    #[test]
    fn token_is_prefix_plus_millis() {
        let at = Utc.timestamp_millis_opt(1_760_000_000_123).unwrap();
        assert_eq!(generate_token(at), "mock-jwt-token-1760000000123");
    }

    #[test]
    fn start_then_clear() {
        let sessions = SessionStore::new(Arc::new(MemoryKv::new()));
        assert!(!sessions.is_present().unwrap());

        let token = sessions.start().unwrap();
        assert!(token.starts_with(TOKEN_PREFIX));
        assert_eq!(sessions.token().unwrap().as_deref(), Some(token.as_str()));

        sessions.clear().unwrap();
        assert!(!sessions.is_present().unwrap());
        sessions.clear().unwrap();
    }

    #[test]
    fn empty_stored_token_counts_as_absent() {
        let kv = Arc::new(MemoryKv::new());
        kv.set(keys::SESSION_TOKEN, "\"\"").unwrap();
        let sessions = SessionStore::new(kv);
        assert!(!sessions.is_present().unwrap());
    }
}
