//! Protected-route guard.
//!
//! Decides whether a screen may render for the current [`AuthState`].
//! While the startup session check is still pending the guard answers
//! [`GuardDecision::Pending`] and never redirects, so a valid session is
//! not bounced to the login screen before it has been read.

use std::fmt;

use serde::Serialize;
use tracing::warn;

use crate::auth::AuthState;
use crate::notice::Notice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Landing,
    Login,
    Register,
    Dashboard,
    Tickets,
    NotFound,
}

impl Route {
    /// Map a path to a route. `/auth/signup` is kept as an alias of
    /// `/auth/register`; unknown paths map to [`Route::NotFound`].
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let trimmed = path.trim();
        let normalized = if trimmed.len() > 1 {
            trimmed.trim_end_matches('/')
        } else {
            trimmed
        };
        match normalized {
            "/" | "" => Self::Landing,
            "/auth/login" => Self::Login,
            "/auth/register" | "/auth/signup" => Self::Register,
            "/dashboard" => Self::Dashboard,
            "/tickets" => Self::Tickets,
            _ => Self::NotFound,
        }
    }

    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Landing => "/",
            Self::Login => "/auth/login",
            Self::Register => "/auth/register",
            Self::Dashboard => "/dashboard",
            Self::Tickets => "/tickets",
            Self::NotFound => "/404",
        }
    }

    #[must_use]
    pub const fn is_protected(self) -> bool {
        matches!(self, Self::Dashboard | Self::Tickets)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GuardDecision {
    Allow,
    /// Auth state is still unknown: render nothing and wait.
    Pending,
    Redirect { to: Route, notice: Notice },
}

impl GuardDecision {
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Stateless guard; the login entry point is the only configuration.
#[derive(Debug, Clone, Copy)]
pub struct RouteGuard {
    login: Route,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self {
            login: Route::Login,
        }
    }
}

impl RouteGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn check(&self, state: AuthState, route: Route) -> GuardDecision {
        if !route.is_protected() {
            return GuardDecision::Allow;
        }
        match state {
            AuthState::Authenticated => GuardDecision::Allow,
            AuthState::Unknown => GuardDecision::Pending,
            AuthState::Unauthenticated => {
                warn!(route = %route, "protected route without a session");
                GuardDecision::Redirect {
                    to: self.login,
                    notice: Notice::session_expired(),
                }
            }
        }
    }
}
