use crate::commands::backup::resolve_backup_dir;
use crate::commands::{print_json, Context};
use crate::util::{today_local, truncate};
use anyhow::{Context as _, Result};
use callsheet_core::domain::{ContactId, ImportAction};
use callsheet_core::rules::{ReconcileOptions, ReconcileSummary};
use callsheet_import::{
    open_source, ApplyExecutor, ApplyOptions, ExtractReport, ImportPlan, Planner,
};
use chrono::Utc;
use clap::{Args, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;

const DEFAULT_PLAN_FILE: &str = "import-plan.json";
const NAME_WIDTH: usize = 32;

#[derive(Debug, Subcommand)]
pub enum ImportCommand {
    /// Read a workbook and write a reviewable import plan
    Plan(PlanArgs),
    /// Show the decisions in a plan
    Review(ReviewArgs),
    /// Flip decisions between skip and their matched action
    Toggle(ToggleArgs),
    /// Back up the store, then apply a reviewed plan
    Apply(ApplyArgs),
}

#[derive(Debug, Args)]
pub struct PlanArgs {
    /// CSV/TSV file, directory of CSV files, or JSON workbook
    pub input: PathBuf,
    #[arg(long, short, default_value = DEFAULT_PLAN_FILE)]
    pub out: PathBuf,
}

#[derive(Debug, Args)]
pub struct ReviewArgs {
    #[arg(default_value = DEFAULT_PLAN_FILE)]
    pub plan: PathBuf,
    #[arg(long, value_enum)]
    pub action: Option<ActionFilter>,
}

#[derive(Debug, Args)]
pub struct ToggleArgs {
    #[arg(long, default_value = DEFAULT_PLAN_FILE)]
    pub plan: PathBuf,
    /// Decision indices as printed by `import review`
    #[arg(required = true)]
    pub index: Vec<usize>,
}

#[derive(Debug, Args)]
pub struct ApplyArgs {
    #[arg(default_value = DEFAULT_PLAN_FILE)]
    pub plan: PathBuf,
    /// Report what would change without writing a backup or touching the store
    #[arg(long)]
    pub dry_run: bool,
    #[arg(long)]
    pub backup_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ActionFilter {
    New,
    Merge,
    Skip,
}

impl From<ActionFilter> for ImportAction {
    fn from(filter: ActionFilter) -> Self {
        match filter {
            ActionFilter::New => ImportAction::New,
            ActionFilter::Merge => ImportAction::Merge,
            ActionFilter::Skip => ImportAction::Skip,
        }
    }
}

#[derive(Debug, Serialize)]
struct PlanReport<'a> {
    plan: String,
    input: &'a str,
    extract: &'a ExtractReport,
    summary: &'a ReconcileSummary,
    warnings: &'a [String],
}

#[derive(Debug, Serialize)]
struct ReviewRow<'a> {
    index: usize,
    action: ImportAction,
    name: &'a str,
    phone: &'a str,
    normalized_phone: &'a str,
    sheet: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    group: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    existing_id: Option<ContactId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    existing_name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ToggleReport<'a> {
    toggled: Vec<ToggledRow>,
    summary: &'a ReconcileSummary,
}

#[derive(Debug, Serialize)]
struct ToggledRow {
    index: usize,
    action: ImportAction,
}

pub fn plan(ctx: &Context<'_>, args: PlanArgs) -> Result<()> {
    let import = &ctx.config.import;
    let source = open_source(&args.input, import.max_input_bytes)?;
    let sheets = source
        .load_sheets()
        .with_context(|| format!("read {}", source.source_name()))?;

    let planner = Planner {
        normalizer: &import.normalizer,
        options: ReconcileOptions {
            min_phone_digits: import.min_phone_digits,
        },
        aliases: &import.sheet_aliases,
        schemas: &import.sources,
    };
    let input = args.input.display().to_string();
    let plan = planner.plan(&input, &sheets, &*ctx.store, Utc::now())?;
    plan.save(&args.out)
        .with_context(|| format!("write plan {}", args.out.display()))?;

    if ctx.json {
        return print_json(&PlanReport {
            plan: args.out.display().to_string(),
            input: &plan.input,
            extract: &plan.extract,
            summary: &plan.summary,
            warnings: &plan.warnings,
        });
    }

    for warning in &plan.warnings {
        eprintln!("warning: {warning}");
    }
    let extract = &plan.extract;
    println!(
        "read {} sheets: {} rows kept ({} blank, {} without a name, {} without a phone)",
        extract.sheets_read,
        extract.rows_out,
        extract.blank_rows,
        extract.unreal_name_dropped,
        extract.missing_phone_dropped
    );
    print_summary(&plan.summary);
    println!("plan written to {}", args.out.display());
    Ok(())
}

pub fn review_plan(json: bool, args: ReviewArgs) -> Result<()> {
    let plan = ImportPlan::load(&args.plan)
        .with_context(|| format!("load plan {}", args.plan.display()))?;
    let wanted = args.action.map(ImportAction::from);

    let rows: Vec<ReviewRow<'_>> = plan
        .decisions
        .iter()
        .enumerate()
        .filter(|(_, decision)| wanted.is_none_or(|action| decision.action == action))
        .map(|(index, decision)| {
            let raw = &decision.candidate.raw;
            ReviewRow {
                index,
                action: decision.action,
                name: &raw.name,
                phone: &raw.phone,
                normalized_phone: &decision.candidate.normalized_phone,
                sheet: &raw.source_sheet,
                group: raw.group.as_deref(),
                existing_id: decision.existing_id(),
                existing_name: decision.existing.as_ref().map(|m| m.name.as_str()),
            }
        })
        .collect();

    if json {
        return print_json(&rows);
    }

    if rows.is_empty() {
        println!("no decisions");
        return Ok(());
    }

    for row in &rows {
        let phone = if row.normalized_phone.is_empty() {
            row.phone
        } else {
            row.normalized_phone
        };
        let existing = match (row.existing_name, row.existing_id) {
            (Some(name), Some(id)) => format!("  -> {} ({})", name, id),
            _ => String::new(),
        };
        println!(
            "{:>4}  {:<5}  {}  {}  [{}]{}",
            row.index,
            row.action.as_str(),
            truncate(row.name, NAME_WIDTH),
            phone,
            row.sheet,
            existing
        );
    }
    print_summary(&plan.summary);
    Ok(())
}

pub fn toggle_plan(json: bool, args: ToggleArgs) -> Result<()> {
    let mut plan = ImportPlan::load(&args.plan)
        .with_context(|| format!("load plan {}", args.plan.display()))?;

    let mut toggled = Vec::with_capacity(args.index.len());
    for index in args.index {
        let action = plan.toggle(index)?;
        toggled.push(ToggledRow { index, action });
    }
    plan.save(&args.plan)
        .with_context(|| format!("write plan {}", args.plan.display()))?;

    if json {
        return print_json(&ToggleReport {
            toggled,
            summary: &plan.summary,
        });
    }

    for row in &toggled {
        println!("{} -> {}", row.index, row.action);
    }
    print_summary(&plan.summary);
    Ok(())
}

pub fn apply(ctx: &mut Context<'_>, args: ApplyArgs) -> Result<()> {
    let plan = ImportPlan::load(&args.plan)
        .with_context(|| format!("load plan {}", args.plan.display()))?;
    let backup_dir = resolve_backup_dir(ctx, args.backup_dir)?;

    let mut executor = ApplyExecutor::new(ApplyOptions {
        batch_size: ctx.config.import.batch_size,
        backup_dir,
        run_date: today_local(),
        dry_run: args.dry_run,
    });
    let result = executor
        .apply(&mut *ctx.store, &plan.decisions)
        .with_context(|| "apply import plan")?;

    if ctx.json {
        return print_json(&result);
    }

    for line in &result.log {
        println!("{line}");
    }
    Ok(())
}

fn print_summary(summary: &ReconcileSummary) {
    println!(
        "{} new, {} merge, {} skip ({} unparsable phones, {} duplicates collapsed)",
        summary.new,
        summary.merge,
        summary.skip,
        summary.unparsable_phone,
        summary.duplicates_collapsed
    );
}
