//! Per-invocation wiring: storage, auth, ticket store, and the route guard.
//!
//! Every subcommand is one "screen". The context runs the startup session
//! check once, then protected screens call [`Context::require`] before
//! touching tickets.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use ticketdesk_core::auth::{AuthError, AuthService};
use ticketdesk_core::config::{ConfigError, EffectiveConfig};
use ticketdesk_core::error::ErrorCode;
use ticketdesk_core::guard::{GuardDecision, Route, RouteGuard};
use ticketdesk_core::model::ValidationError;
use ticketdesk_core::notice::Notice;
use ticketdesk_core::storage::{FileKv, KvStore, StorageError};
use ticketdesk_core::store::{TicketError, TicketStore};
use tracing::debug;

use crate::output::{CliError, OutputMode, render_error, render_notice};

/// Library errors that carry a stable [`ErrorCode`].
pub trait Coded: fmt::Display {
    fn error_code(&self) -> ErrorCode;
}

impl Coded for TicketError {
    fn error_code(&self) -> ErrorCode {
        self.code()
    }
}

impl Coded for AuthError {
    fn error_code(&self) -> ErrorCode {
        self.code()
    }
}

impl Coded for StorageError {
    fn error_code(&self) -> ErrorCode {
        self.code()
    }
}

impl Coded for ConfigError {
    fn error_code(&self) -> ErrorCode {
        self.code()
    }
}

impl Coded for ValidationError {
    fn error_code(&self) -> ErrorCode {
        self.code()
    }
}

/// Marker for an error that has already been rendered to the user.
///
/// `main` exits non-zero without printing it again.
#[derive(Debug)]
pub struct Reported(pub String);

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for Reported {}

/// Render `err` with its code and hint, returning the error to propagate.
pub fn report<E: Coded + ?Sized>(output: OutputMode, err: &E) -> anyhow::Error {
    let message = err.to_string();
    if let Err(render_err) = render_error(output, &CliError::with_code(&message, err.error_code()))
    {
        return render_err;
    }
    Reported(message).into()
}

pub struct Context {
    pub output: OutputMode,
    pub quiet: bool,
    pub data_dir: PathBuf,
    pub auth: AuthService,
    pub tickets: TicketStore,
    guard: RouteGuard,
    seed_demo: bool,
}

impl Context {
    /// Open storage under the configured data directory and run the
    /// startup session check.
    pub fn open(config: EffectiveConfig, output: OutputMode, quiet: bool) -> anyhow::Result<Self> {
        let kv: Arc<dyn KvStore> = match FileKv::open(&config.data_dir) {
            Ok(kv) => Arc::new(kv),
            Err(err) => return Err(report(output, &err)),
        };

        let mut auth = AuthService::new(Arc::clone(&kv));
        let state = auth.check_session().map_err(|err| report(output, &err))?;
        debug!(data_dir = %config.data_dir.display(), ?state, "context ready");

        Ok(Self {
            output,
            quiet,
            data_dir: config.data_dir,
            auth,
            tickets: TicketStore::persisted(kv, config.latency),
            guard: RouteGuard::new(),
            seed_demo: config.app.tickets.seed_demo,
        })
    }

    /// Enforce the guard for a protected screen.
    ///
    /// A redirect renders the session-expired notice and fails. Once
    /// allowed, the demo tickets are written on first use when enabled.
    pub async fn require(&self, route: Route) -> anyhow::Result<()> {
        match self.guard.check(self.auth.state(), route) {
            GuardDecision::Allow => {}
            GuardDecision::Pending => {
                return Err(report(self.output, &AuthError::NotReady));
            }
            GuardDecision::Redirect { to, notice } => {
                let err = CliError {
                    message: notice.message.clone(),
                    suggestion: Some(format!("Run `td login` ({to}) to start a new session.")),
                    error_code: Some(ErrorCode::SessionExpired.code().to_string()),
                };
                render_error(self.output, &err)?;
                return Err(Reported(notice.message).into());
            }
        }

        if route.is_protected() && self.seed_demo {
            let seeded = self
                .tickets
                .seed_demo_if_absent()
                .await
                .map_err(|err| self.fail(&err))?;
            if seeded {
                debug!("demo tickets written");
            }
        }
        Ok(())
    }

    pub fn notice(&self, notice: &Notice) -> anyhow::Result<()> {
        render_notice(self.output, notice, self.quiet)?;
        Ok(())
    }

    pub fn fail<E: Coded + ?Sized>(&self, err: &E) -> anyhow::Error {
        report(self.output, err)
    }
}
