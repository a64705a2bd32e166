use crate::domain::import::{
    ExistingMatch, ExistingRecord, ImportAction, ImportDecision, NormalizedCandidate,
    RawImportRow,
};
use crate::domain::name::names_equivalent;
use crate::domain::phone::{PhoneNormalizer, DEFAULT_MIN_PHONE_DIGITS};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    pub min_phone_digits: usize,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            min_phone_digits: DEFAULT_MIN_PHONE_DIGITS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileSummary {
    pub rows_in: usize,
    pub unparsable_phone: usize,
    pub duplicates_collapsed: usize,
    pub new: usize,
    pub merge: usize,
    pub skip: usize,
}

impl ReconcileSummary {
    pub fn count(&mut self, action: ImportAction) {
        match action {
            ImportAction::New => self.new += 1,
            ImportAction::Merge => self.merge += 1,
            ImportAction::Skip => self.skip += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub decisions: Vec<ImportDecision>,
    pub summary: ReconcileSummary,
}

/// Candidate with the phone normalized, or empty when the value misses the
/// validity cutoff.
pub fn normalize_candidate(
    raw: RawImportRow,
    normalizer: &PhoneNormalizer,
    options: ReconcileOptions,
) -> NormalizedCandidate {
    let normalized_phone = normalizer
        .match_key(&raw.phone, options.min_phone_digits)
        .unwrap_or_default();
    NormalizedCandidate {
        raw,
        normalized_phone,
    }
}

/// Existing records keyed by every usable normalized phone. The first record
/// to claim a key keeps it.
pub fn index_existing(
    existing: &[ExistingRecord],
    options: ReconcileOptions,
) -> HashMap<&str, &ExistingRecord> {
    let mut lookup = HashMap::new();
    for record in existing {
        for phone in [&record.normalized_phone1, &record.normalized_phone2] {
            if is_usable_key(phone, options.min_phone_digits) {
                lookup.entry(phone.as_str()).or_insert(record);
            }
        }
    }
    lookup
}

pub fn classify(
    candidate: NormalizedCandidate,
    lookup: &HashMap<&str, &ExistingRecord>,
) -> ImportDecision {
    match lookup.get(candidate.normalized_phone.as_str()) {
        None => ImportDecision::new_contact(candidate),
        Some(record) => {
            let same_name = names_equivalent(&candidate.raw.name, &record.full_name);
            let existing = ExistingMatch {
                id: record.id,
                name: record.full_name.clone(),
            };
            ImportDecision::matched(candidate, existing, same_name)
        }
    }
}

/// Collapses duplicate phones within the batch (first row wins) and
/// classifies each survivor against the existing snapshot.
pub fn reconcile(
    rows: Vec<RawImportRow>,
    existing: &[ExistingRecord],
    normalizer: &PhoneNormalizer,
    options: ReconcileOptions,
) -> Reconciliation {
    let mut summary = ReconcileSummary {
        rows_in: rows.len(),
        ..Default::default()
    };

    let mut seen = HashSet::new();
    let mut deduped = Vec::with_capacity(rows.len());
    for raw in rows {
        let candidate = normalize_candidate(raw, normalizer, options);
        if candidate.normalized_phone.is_empty() {
            summary.unparsable_phone += 1;
            continue;
        }
        if seen.insert(candidate.normalized_phone.clone()) {
            deduped.push(candidate);
        } else {
            summary.duplicates_collapsed += 1;
        }
    }

    let lookup = index_existing(existing, options);
    let decisions: Vec<ImportDecision> = deduped
        .into_iter()
        .map(|candidate| classify(candidate, &lookup))
        .collect();
    for decision in &decisions {
        summary.count(decision.action);
    }

    Reconciliation { decisions, summary }
}

fn is_usable_key(phone: &str, min_digits: usize) -> bool {
    !phone.is_empty() && phone.trim_start_matches('+').len() >= min_digits.max(1)
}
