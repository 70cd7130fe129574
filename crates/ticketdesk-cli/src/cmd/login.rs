//! `td login` — start a session for the registered account.

use clap::Args;
use serde::Serialize;
use std::io::Write;
use ticketdesk_core::notice::Notice;

use crate::context::Context;
use crate::output::render;

#[derive(Args, Debug)]
pub struct LoginArgs {
    #[arg(long, short = 'u')]
    pub username: String,

    #[arg(long, short = 'p')]
    pub password: String,
}

#[derive(Debug, Serialize)]
struct LoginOutput<'a> {
    ok: bool,
    username: &'a str,
    token: String,
    notice: Notice,
}

pub fn run_login(args: &LoginArgs, ctx: &mut Context) -> anyhow::Result<()> {
    // Unknown user and wrong password surface as the same error.
    let token = ctx
        .auth
        .login(&args.username, &args.password)
        .map_err(|err| ctx.fail(&err))?;

    let notice = Notice::logged_in();
    ctx.notice(&notice)?;
    let payload = LoginOutput {
        ok: true,
        username: &args.username,
        token,
        notice,
    };
    render(ctx.output, &payload, |p, w| {
        writeln!(w, "Signed in as {}. Next: td dashboard", p.username)
    })
}
