//! Mock authentication service.
//!
//! Composes [`SessionStore`] and [`UserRegistry`] into register / login /
//! logout and tracks the session state machine:
//!
//! ```text
//! Unknown --check_session--> Authenticated | Unauthenticated
//! Authenticated   --logout-->        Unauthenticated
//! Unauthenticated --login success--> Authenticated
//! ```
//!
//! Consumers must treat `Unknown` as "not decided yet", never as logged out.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ErrorCode;
use crate::notice::Notice;
use crate::registry::{RegisteredUser, UserRegistry};
use crate::session::SessionStore;
use crate::storage::{KvStore, StorageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    Unknown,
    Authenticated,
    Unauthenticated,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Account already exists. Please log in.")]
    AlreadyRegistered,

    #[error("Username and password are required for registration.")]
    MissingCredentials,

    /// Unknown user and wrong password are deliberately the same error.
    #[error("Login failed: Invalid username or password.")]
    InvalidCredentials,

    #[error("session check has not completed yet")]
    NotReady,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl AuthError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::AlreadyRegistered => ErrorCode::AlreadyRegistered,
            Self::MissingCredentials => ErrorCode::MissingCredentials,
            Self::InvalidCredentials => ErrorCode::InvalidCredentials,
            Self::NotReady => ErrorCode::AuthNotReady,
            Self::Storage(err) => err.code(),
        }
    }
}

fn is_blank(field: &str) -> bool {
    field.trim().is_empty()
}

pub struct AuthService {
    sessions: SessionStore,
    registry: UserRegistry,
    state: AuthState,
}

impl AuthService {
    /// Build a service over one storage backend. Starts in [`AuthState::Unknown`].
    #[must_use]
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self::from_parts(SessionStore::new(Arc::clone(&kv)), UserRegistry::new(kv))
    }

    #[must_use]
    pub const fn from_parts(sessions: SessionStore, registry: UserRegistry) -> Self {
        Self {
            sessions,
            registry,
            state: AuthState::Unknown,
        }
    }

    #[must_use]
    pub const fn state(&self) -> AuthState {
        self.state
    }

    /// True once the startup session check has completed.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        !matches!(self.state, AuthState::Unknown)
    }

    /// `None` while the state is still unknown.
    #[must_use]
    pub const fn is_authenticated(&self) -> Option<bool> {
        match self.state {
            AuthState::Unknown => None,
            AuthState::Authenticated => Some(true),
            AuthState::Unauthenticated => Some(false),
        }
    }

    /// Username of the registered account, if any.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] if the registry cannot be read.
    pub fn registered_username(&self) -> Result<Option<String>, AuthError> {
        Ok(self.registry.current()?.map(|user| user.username))
    }

    /// Resolve the startup state from token presence.
    ///
    /// Only the first call inspects storage; later calls return the
    /// current state unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] if the token cannot be read. The state
    /// stays `Unknown` in that case.
    pub fn check_session(&mut self) -> Result<AuthState, AuthError> {
        if self.is_ready() {
            return Ok(self.state);
        }
        self.state = if self.sessions.is_present()? {
            AuthState::Authenticated
        } else {
            AuthState::Unauthenticated
        };
        debug!(state = ?self.state, "session check complete");
        Ok(self.state)
    }

    /// Register the single mock account. Does not log in.
    ///
    /// # Errors
    ///
    /// - [`AuthError::AlreadyRegistered`] if an account exists (checked first).
    /// - [`AuthError::MissingCredentials`] if either field is empty or only
    ///   whitespace.
    pub fn register(&self, username: &str, password: &str) -> Result<(), AuthError> {
        if self.registry.exists()? {
            return Err(AuthError::AlreadyRegistered);
        }
        if is_blank(username) || is_blank(password) {
            return Err(AuthError::MissingCredentials);
        }

        let user = RegisteredUser {
            username: username.to_string(),
            password: password.to_string(),
        };
        if !self.registry.insert_if_absent(&user)? {
            return Err(AuthError::AlreadyRegistered);
        }
        info!(username, "account registered");
        Ok(())
    }

    /// Start a session when the credentials match the registered account.
    ///
    /// Returns the new session token.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NotReady`] before [`check_session`](Self::check_session).
    /// - [`AuthError::InvalidCredentials`] for no account or any mismatch.
    pub fn login(&mut self, username: &str, password: &str) -> Result<String, AuthError> {
        if !self.is_ready() {
            return Err(AuthError::NotReady);
        }
        if !self.registry.verify(username, password)? {
            warn!(username, "login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.sessions.start()?;
        self.state = AuthState::Authenticated;
        info!(username, "session started");
        Ok(token)
    }

    /// Clear the session. Idempotent.
    ///
    /// Also settles an `Unknown` state: with the token gone the check can
    /// only come out unauthenticated.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] if the token cannot be removed.
    pub fn logout(&mut self) -> Result<Notice, AuthError> {
        self.sessions.clear()?;
        if self.state != AuthState::Unauthenticated {
            info!("session ended");
        }
        self.state = AuthState::Unauthenticated;
        Ok(Notice::logged_out())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKv;

    fn ready_service() -> AuthService {
        let mut auth = AuthService::new(Arc::new(MemoryKv::new()));
        assert_eq!(auth.check_session().unwrap(), AuthState::Unauthenticated);
        auth
    }

    #[test]
    fn starts_unknown_and_not_ready() {
        let auth = AuthService::new(Arc::new(MemoryKv::new()));
        assert_eq!(auth.state(), AuthState::Unknown);
        assert!(!auth.is_ready());
        assert_eq!(auth.is_authenticated(), None);
    }

    #[test]
    fn session_check_finds_existing_token() {
        let kv: Arc<dyn KvStore> = Arc::new(MemoryKv::new());
        SessionStore::new(Arc::clone(&kv)).start().unwrap();

        let mut auth = AuthService::new(kv);
        assert_eq!(auth.check_session().unwrap(), AuthState::Authenticated);
        assert_eq!(auth.is_authenticated(), Some(true));
    }

    #[test]
    fn session_check_runs_once() {
        let kv: Arc<dyn KvStore> = Arc::new(MemoryKv::new());
        let mut auth = AuthService::new(Arc::clone(&kv));
        assert_eq!(auth.check_session().unwrap(), AuthState::Unauthenticated);

        // A token appearing later does not re-run the startup check.
        SessionStore::new(kv).start().unwrap();
        assert_eq!(auth.check_session().unwrap(), AuthState::Unauthenticated);
    }

    #[test]
    fn register_login_scenario() {
        let mut auth = ready_service();
        auth.register("alice", "secret").unwrap();

        assert!(matches!(
            auth.login("alice", "wrong"),
            Err(AuthError::InvalidCredentials)
        ));
        assert_eq!(auth.state(), AuthState::Unauthenticated);

        let token = auth.login("alice", "secret").unwrap();
        assert!(token.starts_with("mock-jwt-token-"));
        assert_eq!(auth.state(), AuthState::Authenticated);
    }

    #[test]
    fn login_without_account_fails() {
        let mut auth = ready_service();
        let err = auth.login("alice", "secret").unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(err.code(), ErrorCode::InvalidCredentials);
    }

    #[test]
    fn login_before_session_check_is_rejected() {
        let mut auth = AuthService::new(Arc::new(MemoryKv::new()));
        auth.register("alice", "secret").unwrap();
        assert!(matches!(
            auth.login("alice", "secret"),
            Err(AuthError::NotReady)
        ));
    }

    #[test]
    fn register_rejects_second_account() {
        let auth = ready_service();
        auth.register("alice", "secret").unwrap();
        assert!(matches!(
            auth.register("bob", "pw"),
            Err(AuthError::AlreadyRegistered)
        ));
    }

    #[test]
    fn existing_account_reported_before_missing_fields() {
        let auth = ready_service();
        auth.register("alice", "secret").unwrap();
        assert!(matches!(
            auth.register("", ""),
            Err(AuthError::AlreadyRegistered)
        ));
    }

    #[test]
    fn register_rejects_blank_fields() {
        let auth = ready_service();
        assert!(matches!(
            auth.register("", "pw"),
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            auth.register("alice", ""),
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            auth.register("alice", "   "),
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            auth.register(" \t", "pw"),
            Err(AuthError::MissingCredentials)
        ));
        // Nothing was stored, so a valid registration still succeeds.
        auth.register("alice", "pw").unwrap();
    }

    #[test]
    fn register_does_not_log_in() {
        let auth = ready_service();
        auth.register("alice", "secret").unwrap();
        assert_eq!(auth.state(), AuthState::Unauthenticated);
        assert_eq!(auth.registered_username().unwrap().as_deref(), Some("alice"));
    }

    #[test]
    fn logout_is_idempotent() {
        let mut auth = ready_service();
        auth.register("alice", "secret").unwrap();
        auth.login("alice", "secret").unwrap();

        let notice = auth.logout().unwrap();
        assert_eq!(notice, Notice::logged_out());
        assert_eq!(auth.state(), AuthState::Unauthenticated);

        auth.logout().unwrap();
        assert_eq!(auth.state(), AuthState::Unauthenticated);
    }

    #[test]
    fn logout_clears_persisted_token() {
        let kv: Arc<dyn KvStore> = Arc::new(MemoryKv::new());
        let mut auth = AuthService::new(Arc::clone(&kv));
        auth.check_session().unwrap();
        auth.register("alice", "secret").unwrap();
        auth.login("alice", "secret").unwrap();
        auth.logout().unwrap();

        let mut fresh = AuthService::new(kv);
        assert_eq!(fresh.check_session().unwrap(), AuthState::Unauthenticated);
    }

    #[test]
    fn session_survives_a_new_service_instance() {
        let kv: Arc<dyn KvStore> = Arc::new(MemoryKv::new());
        let mut auth = AuthService::new(Arc::clone(&kv));
        auth.check_session().unwrap();
        auth.register("alice", "secret").unwrap();
        auth.login("alice", "secret").unwrap();

        let mut fresh = AuthService::new(kv);
        assert_eq!(fresh.check_session().unwrap(), AuthState::Authenticated);
    }
}
