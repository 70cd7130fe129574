//! `td create` — add a ticket.

use clap::Args;
use serde::Serialize;
use std::io::Write;
use ticketdesk_core::guard::Route;
use ticketdesk_core::model::{Priority, Status, Ticket, TicketDraft};
use ticketdesk_core::notice::Notice;

use crate::cmd::show::TicketDetail;
use crate::context::Context;
use crate::output::{OutputMode, Renderable, render};

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[arg(long, short = 't')]
    pub title: String,

    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Defaults to open.
    #[arg(long, short = 's')]
    pub status: Option<Status>,

    /// Defaults to medium.
    #[arg(long, short = 'p')]
    pub priority: Option<Priority>,
}

impl CreateArgs {
    fn to_draft(&self) -> TicketDraft {
        TicketDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status,
            priority: self.priority,
        }
    }
}

/// Payload for commands that return a ticket together with a notice.
#[derive(Debug, Serialize)]
pub struct TicketWithNotice<'a> {
    pub ticket: &'a Ticket,
    pub notice: &'a Notice,
}

/// Shared renderer for `create` and `update`.
pub fn render_ticket_with_notice(
    output: OutputMode,
    ticket: &Ticket,
    notice: &Notice,
) -> anyhow::Result<()> {
    let payload = TicketWithNotice { ticket, notice };
    render(output, &payload, |p, w| {
        let detail = TicketDetail(p.ticket);
        if output.is_pretty() {
            detail.render_human(w)
        } else {
            writeln!(w, "{}", p.ticket.id)
        }
    })
}

pub async fn run_create(args: &CreateArgs, ctx: &Context) -> anyhow::Result<()> {
    ctx.require(Route::Tickets).await?;

    let ticket = ctx
        .tickets
        .create(args.to_draft())
        .await
        .map_err(|err| ctx.fail(&err))?;

    let notice = Notice::ticket_created();
    ctx.notice(&notice)?;
    render_ticket_with_notice(ctx.output, &ticket, &notice)
}
