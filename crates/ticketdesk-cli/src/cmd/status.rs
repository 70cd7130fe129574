//! `td status` — where am I? Session state, account, and data directory.

use serde::Serialize;
use std::io::Write;
use ticketdesk_core::auth::AuthState;

use crate::context::Context;
use crate::output::{pretty_kv, pretty_section, render};

#[derive(Debug, Serialize)]
struct StatusOutput {
    state: AuthState,
    ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    registered_user: Option<String>,
    data_dir: String,
}

const fn state_label(state: AuthState) -> &'static str {
    match state {
        AuthState::Unknown => "checking",
        AuthState::Authenticated => "signed in",
        AuthState::Unauthenticated => "signed out",
    }
}

pub fn run_status(ctx: &Context) -> anyhow::Result<()> {
    let registered_user = ctx
        .auth
        .registered_username()
        .map_err(|err| ctx.fail(&err))?;
    let payload = StatusOutput {
        state: ctx.auth.state(),
        ready: ctx.auth.is_ready(),
        registered_user,
        data_dir: ctx.data_dir.display().to_string(),
    };

    let pretty = ctx.output.is_pretty();
    render(ctx.output, &payload, |s, w| {
        if pretty {
            pretty_section(w, "Session")?;
        }
        pretty_kv(w, "session", state_label(s.state))?;
        pretty_kv(w, "account", s.registered_user.as_deref().unwrap_or("(none)"))?;
        pretty_kv(w, "data dir", &s.data_dir)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_json_omits_missing_account() {
        let payload = StatusOutput {
            state: AuthState::Unauthenticated,
            ready: true,
            registered_user: None,
            data_dir: "/tmp/td".to_string(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["state"], "unauthenticated");
        assert!(json.get("registered_user").is_none());
    }
}
