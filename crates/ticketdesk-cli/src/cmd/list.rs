//! `td list` — all tickets, newest first.

use clap::Args;
use std::io::{self, Write};
use ticketdesk_core::guard::Route;
use ticketdesk_core::model::{Status, Ticket};
use ticketdesk_core::notice::Notice;

use crate::context::Context;
use crate::output::{OutputMode, Renderable, pretty_rule, render_list};

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Only show tickets in this status (open, in_progress, closed).
    #[arg(long)]
    pub status: Option<Status>,
}

/// One ticket as a list row.
pub struct TicketRow<'a>(pub &'a Ticket);

const TITLE_WIDTH: usize = 40;

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

impl Renderable for TicketRow<'_> {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        let t = self.0;
        writeln!(
            w,
            "#{:<5} {:<width$} [{}] {}",
            t.id,
            truncate(&t.title, TITLE_WIDTH),
            t.status.label(),
            t.priority,
            width = TITLE_WIDTH
        )
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer(&mut *w, self.0).map_err(io::Error::other)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        let t = self.0;
        writeln!(w, "{}  {}  {}  {}", t.id, t.status, t.priority, t.title)
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "STATUS", "PRIORITY", "TITLE"]
    }
}

fn filter_by_status(tickets: Vec<Ticket>, status: Option<Status>) -> Vec<Ticket> {
    match status {
        Some(status) => tickets.into_iter().filter(|t| t.status == status).collect(),
        None => tickets,
    }
}

pub async fn run_list(args: &ListArgs, ctx: &Context) -> anyhow::Result<()> {
    ctx.require(Route::Tickets).await?;

    let tickets = match ctx.tickets.list().await {
        Ok(tickets) => filter_by_status(tickets, args.status),
        Err(err) => {
            ctx.notice(&Notice::load_failed())?;
            return Err(ctx.fail(&err));
        }
    };

    if ctx.output == OutputMode::Pretty {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        writeln!(out, "Tickets ({})", tickets.len())?;
        pretty_rule(&mut out)?;
        if tickets.is_empty() {
            writeln!(out, "No tickets yet. Create one with `td create --title ...`.")?;
            return Ok(());
        }
    }

    let rows: Vec<TicketRow<'_>> = tickets.iter().map(TicketRow).collect();
    render_list(&rows, ctx.output)?;
    Ok(())
}
