#![forbid(unsafe_code)]

mod cmd;
mod context;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use context::{Context, Reported, report};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use std::env;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use ticketdesk_core::config;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "td",
    author,
    version,
    about = "ticketdesk: ticket tracking with mock authentication",
    long_about = None
)]
struct Cli {
    /// Enable debug logging (unless TICKETDESK_LOG is set).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress success and info notices.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Emit JSON output (same as `--format json`).
    #[arg(long, global = true)]
    json: bool,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Data directory (default: $TICKETDESK_HOME, then the platform data dir).
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Account",
        about = "Create the account",
        after_help = "EXAMPLES:\n    td register --username alice --password s3cret --confirm s3cret"
    )]
    Register(cmd::register::RegisterArgs),

    #[command(
        next_help_heading = "Account",
        about = "Start a session",
        after_help = "EXAMPLES:\n    td login --username alice --password s3cret"
    )]
    Login(cmd::login::LoginArgs),

    #[command(next_help_heading = "Account", about = "End the session")]
    Logout,

    #[command(next_help_heading = "Account", about = "Show session and account state")]
    Status,

    #[command(
        next_help_heading = "Tickets",
        about = "Show ticket counts",
        after_help = "EXAMPLES:\n    td dashboard\n    td dashboard --json"
    )]
    Dashboard,

    #[command(
        next_help_heading = "Tickets",
        about = "List tickets, newest first",
        after_help = "EXAMPLES:\n    td list\n    td list --status in_progress --format text"
    )]
    List(cmd::list::ListArgs),

    #[command(next_help_heading = "Tickets", about = "Show one ticket")]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Tickets",
        about = "Create a ticket",
        after_help = "EXAMPLES:\n    td create --title \"Printer offline\" --priority high"
    )]
    Create(cmd::create::CreateArgs),

    #[command(
        next_help_heading = "Tickets",
        about = "Edit a ticket",
        after_help = "EXAMPLES:\n    td update 101 --status closed\n    td update 102 --clear-description"
    )]
    Update(cmd::update::UpdateArgs),

    #[command(next_help_heading = "Tickets", about = "Delete a ticket")]
    Delete(cmd::delete::DeleteArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    td completions bash > ~/.local/share/bash-completion/completions/td"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("TICKETDESK_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "ticketdesk=debug,info"
        } else {
            "ticketdesk=info,warn"
        })
    });

    let format = env::var("TICKETDESK_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(io::stderr))
                .init();
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(Commands::Completions(args)) = &cli.command {
        return cmd::completions::run_completions(args, &mut Cli::command());
    }

    let provisional = resolve_output_mode(cli.format, cli.json, None);
    let config = config::resolve_config(cli.data_dir.as_deref())
        .map_err(|err| report(provisional, &err))?;
    let output = resolve_output_mode(cli.format, cli.json, config.app.output.as_deref());
    let mut ctx = Context::open(config, output, cli.quiet)?;

    match cli.command {
        None => cmd::landing::run_landing(&ctx),
        Some(Commands::Register(args)) => cmd::register::run_register(&args, &ctx),
        Some(Commands::Login(args)) => cmd::login::run_login(&args, &mut ctx),
        Some(Commands::Logout) => cmd::logout::run_logout(&mut ctx),
        Some(Commands::Status) => cmd::status::run_status(&ctx),
        Some(Commands::Dashboard) => cmd::dashboard::run_dashboard(&ctx).await,
        Some(Commands::List(args)) => cmd::list::run_list(&args, &ctx).await,
        Some(Commands::Show(args)) => cmd::show::run_show(&args, &ctx).await,
        Some(Commands::Create(args)) => cmd::create::run_create(&args, &ctx).await,
        Some(Commands::Update(args)) => cmd::update::run_update(&args, &ctx).await,
        Some(Commands::Delete(args)) => cmd::delete::run_delete(&args, &ctx).await,
        Some(Commands::Completions(_)) => Ok(()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    debug!(version = env!("CARGO_PKG_VERSION"), "starting");

    let fallback_mode = resolve_output_mode(cli.format, cli.json, None);
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.is::<Reported>() => ExitCode::FAILURE,
        Err(err) => {
            // Unreported failures are I/O or serialization errors.
            let _ = render_error(fallback_mode, &CliError::new(format!("{err:#}")));
            ExitCode::FAILURE
        }
    }
}
