//! `td update` — edit fields of an existing ticket.
//!
//! Unspecified fields keep their current value; `createdAt` never changes.

use clap::Args;
use ticketdesk_core::guard::Route;
use ticketdesk_core::model::{Priority, Status, Ticket, TicketId};
use ticketdesk_core::notice::Notice;

use crate::cmd::create::render_ticket_with_notice;
use crate::cmd::show::parse_ticket_id;
use crate::context::Context;

#[derive(Args, Debug, Default)]
pub struct UpdateArgs {
    #[arg(value_parser = parse_ticket_id)]
    pub id: TicketId,

    #[arg(long, short = 't')]
    pub title: Option<String>,

    #[arg(long, short = 'd', conflicts_with = "clear_description")]
    pub description: Option<String>,

    /// Remove the description.
    #[arg(long)]
    pub clear_description: bool,

    #[arg(long, short = 's')]
    pub status: Option<Status>,

    #[arg(long, short = 'p')]
    pub priority: Option<Priority>,
}

impl UpdateArgs {
    fn apply(&self, mut ticket: Ticket) -> Ticket {
        if let Some(title) = &self.title {
            ticket.title.clone_from(title);
        }
        if self.clear_description {
            ticket.description = None;
        } else if let Some(description) = &self.description {
            ticket.description = Some(description.clone());
        }
        if let Some(status) = self.status {
            ticket.status = status;
        }
        if let Some(priority) = self.priority {
            ticket.priority = priority;
        }
        ticket
    }
}

pub async fn run_update(args: &UpdateArgs, ctx: &Context) -> anyhow::Result<()> {
    ctx.require(Route::Tickets).await?;

    let current = ctx.tickets.get(args.id).await.map_err(|err| ctx.fail(&err))?;
    let updated = ctx
        .tickets
        .update(args.apply(current))
        .await
        .map_err(|err| ctx.fail(&err))?;

    let notice = Notice::ticket_updated(updated.id);
    ctx.notice(&notice)?;
    render_ticket_with_notice(ctx.output, &updated, &notice)
}
