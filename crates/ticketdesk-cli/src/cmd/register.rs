//! `td register` — create the single mock account.
//!
//! The screen checks its own fields (all filled, confirmation matches)
//! before handing off to the auth service. Success does not log in.

use clap::Args;
use serde::Serialize;
use std::io::Write;
use ticketdesk_core::model::ValidationError;
use ticketdesk_core::notice::Notice;

use crate::context::Context;
use crate::output::render;

#[derive(Args, Debug)]
pub struct RegisterArgs {
    #[arg(long, short = 'u')]
    pub username: String,

    #[arg(long, short = 'p')]
    pub password: String,

    /// Repeat the password; must match `--password`.
    #[arg(long)]
    pub confirm: Option<String>,
}

#[derive(Debug, Serialize)]
struct RegisterOutput<'a> {
    ok: bool,
    username: &'a str,
    notice: Notice,
}

fn check_form(args: &RegisterArgs) -> Result<(), ValidationError> {
    let fields = [
        ("username", Some(args.username.as_str())),
        ("password", Some(args.password.as_str())),
        ("confirm", args.confirm.as_deref()),
    ];
    for (field, value) in fields {
        if value.is_some_and(|v| v.trim().is_empty()) {
            return Err(ValidationError::MissingField { field });
        }
    }
    match args.confirm.as_deref() {
        Some(confirm) if confirm != args.password => Err(ValidationError::PasswordMismatch),
        _ => Ok(()),
    }
}

pub fn run_register(args: &RegisterArgs, ctx: &Context) -> anyhow::Result<()> {
    check_form(args).map_err(|err| ctx.fail(&err))?;
    ctx.auth
        .register(&args.username, &args.password)
        .map_err(|err| ctx.fail(&err))?;

    let notice = Notice::registered();
    ctx.notice(&notice)?;
    let payload = RegisterOutput {
        ok: true,
        username: &args.username,
        notice,
    };
    render(ctx.output, &payload, |p, w| {
        writeln!(w, "Registered {}. Next: td login", p.username)
    })
}
