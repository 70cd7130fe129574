//! `td dashboard` — aggregate counts over all tickets.

use serde::Serialize;
use std::io::Write;
use ticketdesk_core::guard::Route;
use ticketdesk_core::notice::Notice;
use ticketdesk_core::stats::DashboardStats;

use crate::context::Context;
use crate::output::{pretty_kv, pretty_rule, pretty_section, render};

#[derive(Debug, Serialize)]
struct DashboardOutput {
    #[serde(flatten)]
    stats: DashboardStats,
    next: &'static str,
}

fn write_dashboard(d: &DashboardOutput, pretty: bool, w: &mut dyn Write) -> std::io::Result<()> {
    if pretty {
        pretty_section(w, "Welcome Back!")?;
    }
    pretty_kv(w, "total", d.stats.total.to_string())?;
    pretty_kv(w, "open", d.stats.open.to_string())?;
    pretty_kv(w, "resolved", d.stats.resolved.to_string())?;
    if pretty {
        pretty_rule(w)?;
        for (status, count) in &d.stats.by_status {
            writeln!(w, "  {:<14} {count}", status.label())?;
        }
        for (priority, count) in &d.stats.by_priority {
            writeln!(w, "  {:<14} {count}", format!("{priority} priority"))?;
        }
        writeln!(w)?;
        writeln!(w, "Ready to manage your tickets? {}", d.next)?;
    }
    Ok(())
}

pub async fn run_dashboard(ctx: &Context) -> anyhow::Result<()> {
    ctx.require(Route::Dashboard).await?;

    let tickets = match ctx.tickets.list().await {
        Ok(tickets) => tickets,
        Err(err) => {
            ctx.notice(&Notice::load_failed())?;
            return Err(ctx.fail(&err));
        }
    };

    let payload = DashboardOutput {
        stats: DashboardStats::from_tickets(&tickets),
        next: "td list",
    };
    let pretty = ctx.output.is_pretty();
    render(ctx.output, &payload, |d, w| write_dashboard(d, pretty, w))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ticketdesk_core::store::demo_tickets;

    fn payload() -> DashboardOutput {
        DashboardOutput {
            stats: DashboardStats::from_tickets(&demo_tickets(Utc::now())),
            next: "td list",
        }
    }

    #[test]
    fn text_output_is_three_counts() {
        let mut buf = Vec::new();
        write_dashboard(&payload(), false, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("total:       3"));
        assert!(text.contains("open:        2"));
        assert!(text.contains("resolved:    1"));
    }

    #[test]
    fn pretty_output_lists_breakdowns() {
        let mut buf = Vec::new();
        write_dashboard(&payload(), true, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("Welcome Back!"));
        assert!(text.contains("In Progress"));
        assert!(text.contains("high priority"));
    }

    #[test]
    fn json_flattens_stats() {
        let json = serde_json::to_value(payload()).unwrap();
        assert_eq!(json["total"], 3);
        assert_eq!(json["by_status"]["closed"], 1);
    }
}
