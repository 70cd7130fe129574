//! Single-account user registry.
//!
//! Holds at most one `{username, password}` pair under
//! [`keys::REGISTERED_USER`]. Passwords are compared in plaintext; this
//! registry is a mock and must not hold real credentials.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::storage::{KvStore, KvStoreExt, StorageError, keys};

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredUser {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for RegisteredUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredUser")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct UserRegistry {
    kv: Arc<dyn KvStore>,
}

impl UserRegistry {
    #[must_use]
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// # Errors
    ///
    /// Returns [`StorageError`] if the stored user cannot be read or decoded.
    pub fn current(&self) -> Result<Option<RegisteredUser>, StorageError> {
        self.kv.get_json(keys::REGISTERED_USER)
    }

    /// # Errors
    ///
    /// Returns [`StorageError`] if the registry cannot be read.
    pub fn exists(&self) -> Result<bool, StorageError> {
        Ok(self.kv.get(keys::REGISTERED_USER)?.is_some())
    }

    /// Store `user` unless an account already exists.
    ///
    /// Returns `false` without writing when the slot is taken. The check and
    /// the write happen in one exclusive section.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the registry cannot be read or written.
    pub fn insert_if_absent(&self, user: &RegisteredUser) -> Result<bool, StorageError> {
        self.kv.with_exclusive(|view| {
            if view.get(keys::REGISTERED_USER)?.is_some() {
                return Ok(false);
            }
            view.set_json(keys::REGISTERED_USER, user)?;
            Ok(true)
        })
    }

    /// Exact comparison of both fields. `false` when nobody is registered.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the stored user cannot be read.
    pub fn verify(&self, username: &str, password: &str) -> Result<bool, StorageError> {
        Ok(self
            .current()?
            .is_some_and(|user| user.username == username && user.password == password))
    }
}
