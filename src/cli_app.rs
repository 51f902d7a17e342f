//! Top-level CLI definition and dispatch.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;

use clap::{Parser, Subcommand};
use colored::Colorize;

use crate::alerts::{ActiveAlert, AlertEscalator, AlertSink};
use crate::core::config::MonitorConfig;
use crate::core::errors::Result;
use crate::core::events::{NullSink, Severity};
use crate::evaluator::{self, EvaluationResult};
use crate::resolver::{self, ProjectAccessor, ResolvedRoot};
use crate::scanner::{DirectoryScanner, Inventory};

/// Workspace Quota Monitor — alerts before an export exceeds a size cap.
#[derive(Parser)]
#[command(name = "wqm", version, about)]
pub struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Workspace path to scan. Overrides the config file and project lookup.
    #[arg(long, global = true)]
    pub path: Option<String>,

    /// Size threshold in megabytes (1-20480).
    #[arg(long, global = true)]
    pub threshold_mb: Option<u64>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Scan the workspace and print the size inventory.
    Scan {
        /// Emit the inventory as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Scan and evaluate; exits non-zero when any alert fires.
    Check {
        /// Emit the evaluation result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Poll the workspace and escalate alerts until interrupted.
    Watch,
}

/// Reads the current project from `WQM_PROJECT`, standing in for the plugin
/// host's project lookup.
struct EnvProjectAccessor;

impl ProjectAccessor for EnvProjectAccessor {
    fn current_project(&self) -> Option<String> {
        std::env::var("WQM_PROJECT")
            .ok()
            .filter(|value| !value.trim().is_empty())
    }
}

/// Prints alerts to the terminal with the occurrence counter.
struct ConsoleAlertSink;

impl AlertSink for ConsoleAlertSink {
    fn display(&self, alert: &ActiveAlert) {
        let tag = format!("[{}/{}]", alert.occurrence, alert.max_occurrences);
        match alert.severity {
            Severity::Error => {
                eprintln!("{} {} {}", "ALERT".red().bold(), tag.dimmed(), alert.message);
            }
            Severity::Warning => {
                eprintln!("{} {} {}", "WARN ".yellow().bold(), tag.dimmed(), alert.message);
            }
        }
    }
}

/// Dispatches a parsed command line.
pub fn run(cli: &Cli) -> Result<ExitCode> {
    let config = load_config(cli)?;
    let Some(root) = resolve_root(&config) else {
        println!("no project open — pass --path or set WQM_PROJECT");
        return Ok(ExitCode::SUCCESS);
    };

    let scanner = DirectoryScanner::new(config.grouped_extension.clone());
    match cli.command {
        Command::Scan { json } => {
            let inventory = scanner.scan(&root, &NullSink);
            if json {
                println!("{}", serde_json::to_string_pretty(&inventory)?);
            } else {
                print_inventory(&inventory);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { json } => {
            let inventory = scanner.scan(&root, &NullSink);
            let result = evaluator::evaluate(&inventory, &config.threshold(), &NullSink);
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_evaluation(&result);
            }
            if result.alerts.is_empty() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Watch => watch_loop(&config, &scanner, &root),
    }
}

fn load_config(cli: &Cli) -> Result<MonitorConfig> {
    let mut config = match &cli.config {
        Some(path) => MonitorConfig::load(path)?,
        None => MonitorConfig::default(),
    };
    if let Some(path) = &cli.path {
        config.path = Some(path.clone());
    }
    if let Some(threshold_mb) = cli.threshold_mb {
        config.threshold_mb = threshold_mb;
    }
    config.validate()?;
    Ok(config)
}

fn resolve_root(config: &MonitorConfig) -> Option<PathBuf> {
    let fallback = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let resolved = resolver::resolve(config.path.as_deref(), &EnvProjectAccessor, &fallback);
    match resolved {
        ResolvedRoot::NoProject => None,
        other => other.path().map(Path::to_path_buf),
    }
}

fn print_inventory(inventory: &Inventory) {
    println!("{}", inventory.scan_path.bold());
    for file in &inventory.files {
        println!("  {:>12}  {}", file.size_formatted, file.name);
    }
    println!(
        "{} file(s), {} total; {} grouped file(s), {} combined",
        inventory.files.len(),
        inventory.total_size_formatted.bold(),
        inventory.grouped_files.len(),
        inventory.grouped_total_size_formatted.bold(),
    );
}

fn print_evaluation(result: &EvaluationResult) {
    if result.is_quiet() {
        println!("{}", "within limits".green());
        return;
    }
    for alert in &result.alerts {
        println!("{} {alert}", "ALERT".red().bold());
    }
    for warning in &result.warnings {
        println!("{} {warning}", "WARN ".yellow().bold());
    }
}

/// Serial scan loop: the next scan starts only after the previous one and its
/// evaluation finished, so scans never overlap.
fn watch_loop(
    config: &MonitorConfig,
    scanner: &DirectoryScanner,
    root: &Path,
) -> Result<ExitCode> {
    let escalator = AlertEscalator::with_interval(
        Arc::new(ConsoleAlertSink) as Arc<dyn AlertSink>,
        config.repeat_interval(),
    );
    let threshold = config.threshold();
    loop {
        let inventory = scanner.scan(root, &NullSink);
        let result = evaluator::evaluate(&inventory, &threshold, &NullSink);
        for alert in &result.alerts {
            escalator.deliver(Severity::Error, alert);
        }
        for warning in &result.warnings {
            escalator.deliver(Severity::Warning, warning);
        }
        thread::sleep(config.poll_interval());
    }
}
