//! `td` with no subcommand — the landing screen.

use serde::Serialize;
use std::io::Write;
use ticketdesk_core::auth::AuthState;
use ticketdesk_core::guard::Route;

use crate::context::Context;
use crate::output::{pretty_rule, render};

#[derive(Debug, Serialize)]
struct Feature {
    title: &'static str,
    description: &'static str,
}

const FEATURES: [Feature; 3] = [
    Feature {
        title: "Unified Design",
        description: "One consistent ticket workflow on every surface.",
    },
    Feature {
        title: "Secure Workflow",
        description: "Protected screens and session management with local storage.",
    },
    Feature {
        title: "Full CRUD",
        description: "Create, read, update, and delete tickets with validation.",
    },
];

#[derive(Debug, Serialize)]
struct Link {
    label: &'static str,
    route: Route,
    command: &'static str,
}

#[derive(Debug, Serialize)]
struct Landing {
    app: &'static str,
    tagline: &'static str,
    authenticated: bool,
    features: &'static [Feature],
    links: Vec<Link>,
}

fn links_for(state: AuthState) -> Vec<Link> {
    if state == AuthState::Authenticated {
        vec![
            Link {
                label: "Dashboard",
                route: Route::Dashboard,
                command: "td dashboard",
            },
            Link {
                label: "Tickets",
                route: Route::Tickets,
                command: "td list",
            },
        ]
    } else {
        vec![
            Link {
                label: "Login",
                route: Route::Login,
                command: "td login --username <name> --password <password>",
            },
            Link {
                label: "Get Started",
                route: Route::Register,
                command: "td register --username <name> --password <password>",
            },
        ]
    }
}

pub fn run_landing(ctx: &Context) -> anyhow::Result<()> {
    let state = ctx.auth.state();
    let landing = Landing {
        app: "TicketDesk",
        tagline: "Simple, efficient ticket management. Streamline your workflow with ease.",
        authenticated: state == AuthState::Authenticated,
        features: &FEATURES,
        links: links_for(state),
    };

    let pretty = ctx.output.is_pretty();
    render(ctx.output, &landing, |l, w| {
        writeln!(w, "{}", l.app)?;
        writeln!(w, "{}", l.tagline)?;
        if pretty {
            writeln!(w)?;
            writeln!(w, "Core Features")?;
            pretty_rule(w)?;
            for feature in l.features {
                writeln!(w, "  {:<16} {}", feature.title, feature.description)?;
            }
            writeln!(w)?;
        }
        for link in &l.links {
            writeln!(w, "{:<12} {}", link.label, link.command)?;
        }
        Ok(())
    })
}
