//! `td logout` — clear the session. Safe to repeat.

use serde::Serialize;
use std::io::Write;
use ticketdesk_core::notice::Notice;

use crate::context::Context;
use crate::output::render;

#[derive(Debug, Serialize)]
struct LogoutOutput {
    ok: bool,
    notice: Notice,
}

pub fn run_logout(ctx: &mut Context) -> anyhow::Result<()> {
    let notice = ctx.auth.logout().map_err(|err| ctx.fail(&err))?;
    ctx.notice(&notice)?;
    let payload = LogoutOutput { ok: true, notice };
    render(ctx.output, &payload, |_, w| writeln!(w, "Signed out."))
}
