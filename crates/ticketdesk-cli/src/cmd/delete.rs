//! `td delete` — remove one ticket.
//!
//! Asks for confirmation on an interactive terminal unless `--force` is
//! given. Non-interactive runs proceed without prompting.

use clap::Args;
use serde::Serialize;
use std::io::{IsTerminal, Write};
use ticketdesk_core::guard::Route;
use ticketdesk_core::model::TicketId;
use ticketdesk_core::notice::Notice;

use crate::cmd::show::parse_ticket_id;
use crate::context::{Context, Reported};
use crate::output::{CliError, render, render_error};

#[derive(Args, Debug)]
pub struct DeleteArgs {
    #[arg(value_parser = parse_ticket_id)]
    pub id: TicketId,

    /// Skip the confirmation prompt.
    #[arg(long, short = 'f')]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct DeleteOutput {
    id: TicketId,
    deleted: bool,
    notice: Notice,
}

fn confirm_delete(title: &str) -> anyhow::Result<bool> {
    if !std::io::stdin().is_terminal() || !std::io::stdout().is_terminal() {
        return Ok(true);
    }

    eprint!("Are you sure you want to delete the ticket: \"{title}\"? [y/N] ");
    std::io::stderr().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(is_yes(&input))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

pub async fn run_delete(args: &DeleteArgs, ctx: &Context) -> anyhow::Result<()> {
    ctx.require(Route::Tickets).await?;

    if !args.force {
        let ticket = ctx.tickets.get(args.id).await.map_err(|err| ctx.fail(&err))?;
        if !confirm_delete(&ticket.title)? {
            let message = format!("deletion of ticket #{} cancelled", args.id);
            render_error(ctx.output, &CliError::new(&message))?;
            return Err(Reported(message).into());
        }
    }

    ctx.tickets
        .delete(args.id)
        .await
        .map_err(|err| ctx.fail(&err))?;

    let notice = Notice::ticket_deleted(args.id);
    ctx.notice(&notice)?;
    let payload = DeleteOutput {
        id: args.id,
        deleted: true,
        notice,
    };
    render(ctx.output, &payload, |p, w| writeln!(w, "deleted #{}", p.id))
}
