//! Binary entry point for `wqm`.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use workspace_quota_monitor::cli_app::{Cli, run};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("WQM_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("wqm: {err}");
            ExitCode::FAILURE
        }
    }
}
