use crate::error::{ImportError, Result};
use crate::extract::{ExtractReport, Extractor};
use crate::sheet::Sheet;
use crate::store::ContactStore;
use callsheet_core::domain::{
    ExistingRecord, ImportAction, ImportDecision, PhoneNormalizer, SheetAliases, SheetSchema,
};
use callsheet_core::rules::{reconcile, ReconcileOptions, ReconcileSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info};

pub const PLAN_VERSION: u32 = 1;

/// Reviewed import, persisted between `plan` and `apply`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportPlan {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub input: String,
    #[serde(default)]
    pub extract: ExtractReport,
    pub summary: ReconcileSummary,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub decisions: Vec<ImportDecision>,
}

/// Everything needed to turn sheets into decisions.
pub struct Planner<'a> {
    pub normalizer: &'a PhoneNormalizer,
    pub options: ReconcileOptions,
    pub aliases: &'a SheetAliases,
    pub schemas: &'a [SheetSchema],
}

impl<'a> Planner<'a> {
    /// Extracts, snapshots the store once and reconciles.
    pub fn plan<S: ContactStore + ?Sized>(
        &self,
        input: &str,
        sheets: &[Sheet],
        store: &S,
        now: DateTime<Utc>,
    ) -> Result<ImportPlan> {
        let extraction = Extractor::new(self.aliases, self.schemas).extract(sheets)?;
        let existing: Vec<ExistingRecord> = store
            .list_contacts()?
            .iter()
            .map(|contact| ExistingRecord::from_contact(contact, self.normalizer))
            .collect();
        debug!(existing = existing.len(), "existing snapshot taken");

        let reconciliation = reconcile(extraction.rows, &existing, self.normalizer, self.options);
        info!(
            rows = reconciliation.summary.rows_in,
            new = reconciliation.summary.new,
            merge = reconciliation.summary.merge,
            skip = reconciliation.summary.skip,
            "import planned"
        );
        Ok(ImportPlan {
            version: PLAN_VERSION,
            created_at: now,
            input: input.to_string(),
            extract: extraction.report,
            summary: reconciliation.summary,
            warnings: extraction.warnings,
            decisions: reconciliation.decisions,
        })
    }
}

impl ImportPlan {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        let plan: ImportPlan = serde_json::from_slice(&data)
            .map_err(|err| ImportError::InvalidPlan(format!("{}: {err}", path.display())))?;
        plan.validate()?;
        Ok(plan)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut data = serde_json::to_vec_pretty(self).map_err(io::Error::from)?;
        data.push(b'\n');
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, data)?;
        Ok(())
    }

    /// Rejects unknown versions and decisions that break the merge/new rule.
    pub fn validate(&self) -> Result<()> {
        if self.version != PLAN_VERSION {
            return Err(ImportError::InvalidPlan(format!(
                "unsupported plan version {} (expected {PLAN_VERSION})",
                self.version
            )));
        }
        for (index, decision) in self.decisions.iter().enumerate() {
            decision
                .validate()
                .map_err(|err| ImportError::InvalidPlan(format!("decision {index}: {err}")))?;
        }
        Ok(())
    }

    /// Cycles one decision through the review override and returns its new
    /// action.
    pub fn toggle(&mut self, index: usize) -> Result<ImportAction> {
        let len = self.decisions.len();
        let decision = self.decisions.get_mut(index).ok_or_else(|| {
            ImportError::InvalidPlan(format!("decision index {index} out of range (0..{len})"))
        })?;
        let action = decision.toggle();
        self.recount();
        Ok(action)
    }

    pub fn actionable(&self) -> impl Iterator<Item = &ImportDecision> {
        self.decisions.iter().filter(|decision| decision.is_actionable())
    }

    fn recount(&mut self) {
        self.summary.new = 0;
        self.summary.merge = 0;
        self.summary.skip = 0;
        for decision in &self.decisions {
            self.summary.count(decision.action);
        }
    }
}
