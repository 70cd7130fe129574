//! `td show` — one ticket in full.

use clap::Args;
use std::io::{self, Write};
use ticketdesk_core::guard::Route;
use ticketdesk_core::model::{Ticket, TicketId};

use crate::context::Context;
use crate::output::{Renderable, pretty_kv, pretty_section, render_item};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Ticket id, with or without a leading `#`.
    #[arg(value_parser = parse_ticket_id)]
    pub id: TicketId,
}

/// Accepts `101` and `#101`.
pub fn parse_ticket_id(raw: &str) -> Result<TicketId, String> {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('#')
        .unwrap_or(trimmed)
        .parse::<TicketId>()
        .map_err(|_| format!("invalid ticket id '{raw}'"))
}

/// Full detail view of a ticket.
pub struct TicketDetail<'a>(pub &'a Ticket);

impl Renderable for TicketDetail<'_> {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        let t = self.0;
        pretty_section(w, &format!("Ticket #{}: {}", t.id, t.title))?;
        pretty_kv(w, "status", t.status.label())?;
        pretty_kv(w, "priority", t.priority.to_string())?;
        pretty_kv(w, "created", t.created_at.format("%Y-%m-%d %H:%M UTC").to_string())?;
        if let Some(description) = &t.description {
            writeln!(w)?;
            writeln!(w, "{description}")?;
        }
        Ok(())
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *w, self.0).map_err(io::Error::other)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        let t = self.0;
        writeln!(w, "id: {}", t.id)?;
        writeln!(w, "title: {}", t.title)?;
        writeln!(w, "status: {}", t.status)?;
        writeln!(w, "priority: {}", t.priority)?;
        writeln!(w, "created: {}", t.created_at.to_rfc3339())?;
        writeln!(w, "description: {}", t.description.as_deref().unwrap_or(""))
    }
}

pub async fn run_show(args: &ShowArgs, ctx: &Context) -> anyhow::Result<()> {
    ctx.require(Route::Tickets).await?;
    let ticket = ctx.tickets.get(args.id).await.map_err(|err| ctx.fail(&err))?;
    render_item(&TicketDetail(&ticket), ctx.output)?;
    Ok(())
}
