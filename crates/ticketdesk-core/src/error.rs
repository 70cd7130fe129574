use std::fmt;

/// Machine-readable error codes shared by the library and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    TicketNotFound,
    InvalidEnumValue,
    ValidationFailed,
    AlreadyRegistered,
    MissingCredentials,
    InvalidCredentials,
    SessionExpired,
    AuthNotReady,
    CorruptStorage,
    StorageWriteFailed,
    LockContention,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::TicketNotFound => "E2001",
            Self::InvalidEnumValue => "E2002",
            Self::ValidationFailed => "E2003",
            Self::CorruptStorage => "E3001",
            Self::AlreadyRegistered => "E4001",
            Self::MissingCredentials => "E4002",
            Self::InvalidCredentials => "E4003",
            Self::SessionExpired => "E4004",
            Self::AuthNotReady => "E4005",
            Self::StorageWriteFailed => "E5001",
            Self::LockContention => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::TicketNotFound => "Ticket not found",
            Self::InvalidEnumValue => "Invalid status/priority value",
            Self::ValidationFailed => "Validation failed",
            Self::AlreadyRegistered => "Account already exists",
            Self::MissingCredentials => "Username and password are required",
            Self::InvalidCredentials => "Invalid username or password",
            Self::SessionExpired => "Session expired",
            Self::AuthNotReady => "Session check has not completed",
            Self::CorruptStorage => "Stored value is not valid JSON",
            Self::StorageWriteFailed => "Storage write failed",
            Self::LockContention => "Lock contention",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to users.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in config.toml and retry."),
            Self::TicketNotFound => Some("Run `td list` to see existing ticket ids."),
            Self::InvalidEnumValue => {
                Some("Use open|in_progress|closed for status and low|medium|high for priority.")
            }
            Self::ValidationFailed => None,
            Self::AlreadyRegistered => Some("Run `td login` with the registered account."),
            Self::MissingCredentials => Some("Pass both --username and --password."),
            Self::InvalidCredentials => Some("Check the username and password and retry."),
            Self::SessionExpired => Some("Run `td login` to start a new session."),
            Self::AuthNotReady => None,
            Self::CorruptStorage => Some("Remove the damaged file from the data directory."),
            Self::StorageWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => Some("Retry after the other `td` process releases its lock."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
