// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, set up logging, hand over to `ui::run`.
// - The exit status reflects whether the dispatched command succeeded.

use clap::Parser;
use gist_cli::{cli::Cli, ui};
use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "gist_cli=debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match ui::run(cli)? {
        ui::Outcome::Success => Ok(ExitCode::SUCCESS),
        ui::Outcome::Failed => Ok(ExitCode::FAILURE),
    }
}
