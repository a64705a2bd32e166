use crate::backup::write_backup;
use crate::error::{ImportError, Result};
use crate::store::{ContactStore, NewContact};
use crate::tag_table::TagTable;
use callsheet_core::domain::{
    split_full_name, CallStatus, ImportAction, ImportDecision, TagId, TagName,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ApplyOptions {
    /// Progress granularity; has no transactional meaning.
    pub batch_size: usize,
    pub backup_dir: PathBuf,
    /// Date used to name the backup file.
    pub run_date: NaiveDate,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportRunResult {
    pub processed: usize,
    pub created: usize,
    pub merged: usize,
    pub failed: usize,
    pub tags_created: Vec<String>,
    pub backup_path: Option<PathBuf>,
    pub dry_run: bool,
    pub log: Vec<String>,
}

impl ImportRunResult {
    fn line(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
    }
}

enum RowOutcome {
    Created,
    Merged,
}

/// Applies reviewed decisions to a contact store, one row at a time.
///
/// Rows fail independently: an error on one row is logged and counted and
/// the run moves on. Only a failed backup, an unreachable store, or an
/// invalid decision list stop the run, and all of those happen before the
/// first write.
pub struct ApplyExecutor {
    options: ApplyOptions,
    tags: TagTable,
}

impl ApplyExecutor {
    pub fn new(options: ApplyOptions) -> Self {
        Self {
            options,
            tags: TagTable::new(),
        }
    }

    pub fn apply<S: ContactStore + ?Sized>(
        &mut self,
        store: &mut S,
        decisions: &[ImportDecision],
    ) -> Result<ImportRunResult> {
        for decision in decisions {
            decision.validate()?;
        }
        let actionable: Vec<&ImportDecision> =
            decisions.iter().filter(|decision| decision.is_actionable()).collect();
        let sheet_tags = distinct_sheet_tags(&actionable)?;

        // Tags may have changed since the last run.
        self.tags.invalidate();
        self.tags.load(&*store)?;

        let mut result = ImportRunResult {
            dry_run: self.options.dry_run,
            ..Default::default()
        };
        if self.options.dry_run {
            self.preview(&actionable, &sheet_tags, &mut result);
            return Ok(result);
        }

        let backup = write_backup(&*store, &self.options.backup_dir, self.options.run_date)?;
        result.line(format!(
            "backup written: {} ({} contacts)",
            backup.path.display(),
            backup.records
        ));
        result.backup_path = Some(backup.path);

        let mut tag_ids: HashMap<String, TagId> = HashMap::new();
        for (sheet, name) in &sheet_tags {
            let (tag, created) = self.tags.ensure(store, name)?;
            if created {
                result.tags_created.push(tag.name.as_str().to_string());
                result.line(format!("tag created: {}", tag.name.as_str()));
            }
            tag_ids.insert(sheet.clone(), tag.id);
        }

        let total = actionable.len();
        let batch_size = self.options.batch_size.max(1);
        for batch in actionable.chunks(batch_size) {
            for decision in batch {
                let sheet = decision.candidate.raw.source_sheet.as_str();
                let Some(tag_id) = tag_ids.get(sheet).copied() else {
                    return Err(ImportError::Parse(format!("no tag resolved for sheet {sheet}")));
                };
                match apply_one(store, decision, tag_id) {
                    Ok(RowOutcome::Created) => result.created += 1,
                    Ok(RowOutcome::Merged) => result.merged += 1,
                    Err(message) => {
                        let name = decision.candidate.raw.name.as_str();
                        warn!(name, error = %message, "import row failed");
                        result.failed += 1;
                        result.line(format!("error: {name} - {message}"));
                    }
                }
                result.processed += 1;
            }
            info!(processed = result.processed, total, "batch applied");
            result.line(format!("processed {}/{}", result.processed, total));
        }

        result.line(format!(
            "import complete: {} created, {} merged, {} failed",
            result.created, result.merged, result.failed
        ));
        info!(
            created = result.created,
            merged = result.merged,
            failed = result.failed,
            "import complete"
        );
        Ok(result)
    }

    fn preview(
        &self,
        actionable: &[&ImportDecision],
        sheet_tags: &[(String, TagName)],
        result: &mut ImportRunResult,
    ) {
        for decision in actionable {
            match decision.action {
                ImportAction::New => result.created += 1,
                ImportAction::Merge => result.merged += 1,
                ImportAction::Skip => {}
            }
        }
        result.processed = actionable.len();
        for (_, name) in sheet_tags {
            if self.tags.get(name).is_none() {
                result.tags_created.push(name.as_str().to_string());
                result.line(format!("dry run: would create tag {}", name.as_str()));
            }
        }
        result.line(format!(
            "dry run: would create {} contacts and tag {} existing contacts",
            result.created, result.merged
        ));
    }
}

/// Category tag per distinct source sheet, in first-seen order.
fn distinct_sheet_tags(actionable: &[&ImportDecision]) -> Result<Vec<(String, TagName)>> {
    let mut sheets: Vec<(String, TagName)> = Vec::new();
    for decision in actionable {
        let sheet = &decision.candidate.raw.source_sheet;
        if sheets.iter().any(|(known, _)| known == sheet) {
            continue;
        }
        let name = TagName::new(sheet)
            .map_err(|err| ImportError::Parse(format!("sheet {sheet:?} is not a valid tag: {err}")))?;
        sheets.push((sheet.clone(), name));
    }
    Ok(sheets)
}

fn apply_one<S: ContactStore + ?Sized>(
    store: &mut S,
    decision: &ImportDecision,
    tag_id: TagId,
) -> std::result::Result<RowOutcome, String> {
    match (decision.action, decision.existing_id()) {
        (ImportAction::New, _) => {
            let contact = new_contact(decision);
            let id = store.create_contact(contact).map_err(|err| err.to_string())?;
            store
                .ensure_tag_assigned(id, tag_id)
                .map_err(|err| format!("contact created but tagging failed: {err}"))?;
            debug!(%id, "contact created");
            Ok(RowOutcome::Created)
        }
        (ImportAction::Merge, Some(id)) => {
            let assignment = store
                .ensure_tag_assigned(id, tag_id)
                .map_err(|err| err.to_string())?;
            debug!(%id, ?assignment, "existing contact tagged");
            Ok(RowOutcome::Merged)
        }
        (ImportAction::Merge, None) => Err("merge without an existing contact".to_string()),
        (ImportAction::Skip, _) => Err("skipped decision reached apply".to_string()),
    }
}

fn new_contact(decision: &ImportDecision) -> NewContact {
    let raw = &decision.candidate.raw;
    let full_name = raw.name.trim().to_string();
    let (first_name, last_name) = split_full_name(&full_name);
    NewContact {
        full_name,
        first_name,
        last_name,
        phone_e164: Some(decision.candidate.normalized_phone.clone()),
        phone_raw: Some(raw.phone.clone()),
        call_status: CallStatus::NotChecked,
        source: Some(raw.source_sheet.clone()),
    }
}
