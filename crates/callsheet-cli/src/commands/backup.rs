use crate::commands::{print_json, Context};
use crate::util::today_local;
use anyhow::{Context as _, Result};
use callsheet_import::write_backup;
use callsheet_store::paths;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct BackupArgs {
    /// Directory for the backup file; defaults to import.backup_dir
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct BackupReport {
    output: String,
    contacts: usize,
}

pub fn backup(ctx: &Context<'_>, args: BackupArgs) -> Result<()> {
    let dir = resolve_backup_dir(ctx, args.out_dir)?;
    let outcome = write_backup(&*ctx.store, &dir, today_local())
        .with_context(|| format!("write backup into {}", dir.display()))?;

    if ctx.json {
        let report = BackupReport {
            output: outcome.path.display().to_string(),
            contacts: outcome.records,
        };
        return print_json(&report);
    }

    println!(
        "Backup of {} contacts written to {}",
        outcome.records,
        outcome.path.display()
    );
    Ok(())
}

/// Explicit flag, then config, then the data directory.
pub fn resolve_backup_dir(ctx: &Context<'_>, explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = explicit.or_else(|| ctx.config.import.backup_dir.clone()) {
        return Ok(dir);
    }
    Ok(paths::default_backup_dir()?)
}
