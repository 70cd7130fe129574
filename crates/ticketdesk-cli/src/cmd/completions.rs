//! `td completions` — print a shell completion script.

use clap::Args;
use clap_complete::{Shell, generate};
use std::io::Write;

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Write the completion script for `command` to stdout.
///
/// Does not touch the data directory, so it works before any account exists.
pub fn run_completions(args: &CompletionsArgs, command: &mut clap::Command) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_completions(args.shell, command, &mut out)?;
    out.flush()?;
    Ok(())
}

fn write_completions(
    shell: Shell,
    command: &mut clap::Command,
    out: &mut dyn Write,
) -> std::io::Result<()> {
    let bin_name = command.get_name().to_string();
    generate(shell, command, bin_name, out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bash_script_mentions_subcommands() {
        let mut command = clap::Command::new("td")
            .subcommand(clap::Command::new("login"))
            .subcommand(clap::Command::new("list"));
        let mut buf = Vec::new();
        write_completions(Shell::Bash, &mut command, &mut buf).unwrap();
        let script = String::from_utf8(buf).unwrap();
        assert!(script.contains("td"));
        assert!(script.contains("login"));
    }
}
