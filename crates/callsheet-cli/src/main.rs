mod commands;
mod error;
mod util;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

use crate::commands::{backup, completions, contacts, import, tags, Context};
use crate::error::{exit_code_for, report_error};
use callsheet_config as config;
use callsheet_store::{paths, Store};

#[derive(Debug, Parser)]
#[command(
    name = "callsheet",
    version,
    about = "Contact import and reconciliation for phone-outreach teams"
)]
struct Cli {
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    json: bool,
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write a dated JSON backup of every stored contact
    Backup(backup::BackupArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
    List(contacts::ListArgs),
    /// Record the outcome of a call
    Status(contacts::SetStatusArgs),
    #[command(subcommand)]
    Tag(tags::TagCommand),
    #[command(subcommand)]
    Import(import::ImportCommand),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    init_logging(verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, verbose);
            exit_code_for(&err)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let Cli {
        db_path,
        config: config_path,
        json,
        verbose,
        command,
    } = cli;

    // Commands that only touch a plan file or stdout never open the database.
    let command = match command {
        Command::Completions(args) => return completions::emit(args),
        Command::Import(import::ImportCommand::Review(args)) => {
            return import::review_plan(json, args)
        }
        Command::Import(import::ImportCommand::Toggle(args)) => {
            return import::toggle_plan(json, args)
        }
        command => command,
    };

    let app_config = config::load(config_path.clone()).with_context(|| "load config")?;
    if verbose {
        match config::resolve_config_path(config_path) {
            Ok(path) if path.exists() => debug!(path = %path.display(), "config resolved"),
            Ok(path) => debug!(path = %path.display(), "config missing, using defaults"),
            Err(err) => debug!(error = %err, "config unavailable"),
        }
    }

    let db_path = paths::resolve_db_path(db_path).with_context(|| "resolve database path")?;
    debug!(path = %db_path.display(), "database path resolved");

    let mut store = Store::open(&db_path)
        .with_context(|| format!("open database {}", db_path.display()))?;
    store.migrate().with_context(|| "run migrations")?;

    let mut ctx = Context {
        store: &mut store,
        json,
        config: &app_config,
    };

    match command {
        Command::Backup(args) => backup::backup(&ctx, args),
        Command::List(args) => contacts::list_contacts(&ctx, args),
        Command::Status(args) => contacts::set_status(&ctx, args),
        Command::Tag(cmd) => match cmd {
            tags::TagCommand::Ls(args) => tags::list_tags(&ctx, args),
        },
        Command::Import(cmd) => match cmd {
            import::ImportCommand::Plan(args) => import::plan(&ctx, args),
            import::ImportCommand::Apply(args) => import::apply(&mut ctx, args),
            import::ImportCommand::Review(_) | import::ImportCommand::Toggle(_) => {
                unreachable!("plan-file commands handled before store initialization")
            }
        },
        Command::Completions(_) => {
            unreachable!("completions command handled before store initialization")
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
