//! Register, log in, browse, and log out against on-disk storage, the way
//! separate CLI invocations share one data directory.

use std::sync::Arc;

use tempfile::TempDir;
use ticketdesk_core::auth::{AuthError, AuthService, AuthState};
use ticketdesk_core::guard::{GuardDecision, Route, RouteGuard};
use ticketdesk_core::notice::Notice;
use ticketdesk_core::storage::{FileKv, KvStore};
use ticketdesk_core::store::{Latency, TicketStore};

fn open(dir: &TempDir) -> Arc<dyn KvStore> {
    Arc::new(FileKv::open(dir.path()).unwrap())
}

fn fresh_auth(dir: &TempDir) -> AuthService {
    let mut auth = AuthService::new(open(dir));
    auth.check_session().unwrap();
    auth
}

#[test]
fn session_persists_across_service_instances() {
    let dir = TempDir::new().unwrap();
    let guard = RouteGuard::new();

    let mut auth = fresh_auth(&dir);
    assert_eq!(auth.state(), AuthState::Unauthenticated);
    assert!(matches!(
        guard.check(auth.state(), Route::Dashboard),
        GuardDecision::Redirect { to: Route::Login, .. }
    ));

    auth.register("alice", "s3cret").unwrap();
    assert_eq!(auth.state(), AuthState::Unauthenticated);
    let token = auth.login("alice", "s3cret").unwrap();
    assert!(token.starts_with("mock-jwt-token-"));

    let mut next = fresh_auth(&dir);
    assert_eq!(next.state(), AuthState::Authenticated);
    assert!(guard.check(next.state(), Route::Tickets).is_allowed());

    assert_eq!(next.logout().unwrap(), Notice::logged_out());
    assert_eq!(fresh_auth(&dir).state(), AuthState::Unauthenticated);
}

#[test]
fn second_registration_is_rejected_on_disk() {
    let dir = TempDir::new().unwrap();
    fresh_auth(&dir).register("alice", "one").unwrap();

    let err = fresh_auth(&dir).register("bob", "two").unwrap_err();
    assert!(matches!(err, AuthError::AlreadyRegistered));

    let mut auth = fresh_auth(&dir);
    assert!(matches!(
        auth.login("bob", "two"),
        Err(AuthError::InvalidCredentials)
    ));
    auth.login("alice", "one").unwrap();
}

#[tokio::test]
async fn tickets_written_by_one_store_are_read_by_the_next() {
    let dir = TempDir::new().unwrap();

    let first = TicketStore::persisted(open(&dir), Latency::none());
    assert!(first.seed_demo_if_absent().await.unwrap());
    first.delete(102).await.unwrap();

    let second = TicketStore::persisted(open(&dir), Latency::none());
    assert!(!second.seed_demo_if_absent().await.unwrap());
    let ids: Vec<_> = second.list().await.unwrap().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![103, 101]);
}
