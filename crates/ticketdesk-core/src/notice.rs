//! Transient user-facing notices.

use serde::Serialize;

use crate::model::TicketId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn session_expired() -> Self {
        Self::error("Your session has expired — please log in again.")
    }

    #[must_use]
    pub fn logged_out() -> Self {
        Self::info("Logged out successfully.")
    }

    #[must_use]
    pub fn registered() -> Self {
        Self::success("Account created successfully! Please log in.")
    }

    #[must_use]
    pub fn logged_in() -> Self {
        Self::success("Login successful!")
    }

    #[must_use]
    pub fn login_failed() -> Self {
        Self::error("Login failed: Invalid username or password.")
    }

    #[must_use]
    pub fn ticket_created() -> Self {
        Self::success("Ticket created successfully!")
    }

    #[must_use]
    pub fn ticket_updated(id: TicketId) -> Self {
        Self::success(format!("Ticket #{id} updated."))
    }

    #[must_use]
    pub fn ticket_deleted(id: TicketId) -> Self {
        Self::success(format!("Ticket #{id} deleted successfully."))
    }

    #[must_use]
    pub fn load_failed() -> Self {
        Self::error("Failed to load tickets. Please retry.")
    }
}
