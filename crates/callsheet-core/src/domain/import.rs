use crate::domain::contact::Contact;
use crate::domain::ids::ContactId;
use crate::domain::phone::PhoneNormalizer;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A spreadsheet row that survived extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawImportRow {
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub source_sheet: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedCandidate {
    pub raw: RawImportRow,
    /// Canonical phone, or empty when the raw value could not be classified.
    pub normalized_phone: String,
}

/// Matching projection of a stored contact, taken once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingRecord {
    pub id: ContactId,
    pub full_name: String,
    pub normalized_phone1: String,
    pub normalized_phone2: String,
}

impl ExistingRecord {
    pub fn from_contact(contact: &Contact, normalizer: &PhoneNormalizer) -> Self {
        let normalize = |value: Option<&str>| value.map(|v| normalizer.normalize(v)).unwrap_or_default();
        Self {
            id: contact.id,
            full_name: contact.full_name.clone(),
            normalized_phone1: normalize(contact.phone_e164.as_deref()),
            normalized_phone2: normalize(contact.phone_raw.as_deref()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportAction {
    New,
    Merge,
    Skip,
}

impl ImportAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            ImportAction::New => "new",
            ImportAction::Merge => "merge",
            ImportAction::Skip => "skip",
        }
    }
}

impl fmt::Display for ImportAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportAction {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(ImportAction::New),
            "merge" => Ok(ImportAction::Merge),
            "skip" => Ok(ImportAction::Skip),
            other => Err(format!("unknown import action: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingMatch {
    pub id: ContactId,
    pub name: String,
}

/// One row's reviewed fate. `Merge` requires a matched record; `New`
/// forbids one; `Skip` may carry either.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDecision {
    pub candidate: NormalizedCandidate,
    pub action: ImportAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing: Option<ExistingMatch>,
}

impl ImportDecision {
    pub fn new_contact(candidate: NormalizedCandidate) -> Self {
        Self {
            candidate,
            action: ImportAction::New,
            existing: None,
        }
    }

    pub fn matched(candidate: NormalizedCandidate, existing: ExistingMatch, skip: bool) -> Self {
        Self {
            candidate,
            action: if skip {
                ImportAction::Skip
            } else {
                ImportAction::Merge
            },
            existing: Some(existing),
        }
    }

    pub fn existing_id(&self) -> Option<ContactId> {
        self.existing.as_ref().map(|existing| existing.id)
    }

    pub fn is_actionable(&self) -> bool {
        self.action != ImportAction::Skip
    }

    /// Review override: an active decision becomes `Skip`; a skipped one
    /// returns to `Merge` when it matched a record, otherwise to `New`.
    pub fn toggle(&mut self) -> ImportAction {
        self.action = match self.action {
            ImportAction::Skip if self.existing.is_some() => ImportAction::Merge,
            ImportAction::Skip => ImportAction::New,
            ImportAction::New | ImportAction::Merge => ImportAction::Skip,
        };
        self.action
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        let invalid = |reason| CoreError::InconsistentDecision {
            name: self.candidate.raw.name.clone(),
            reason,
        };
        match (self.action, self.existing.is_some()) {
            (ImportAction::Merge, false) => Err(invalid("merge requires an existing record")),
            (ImportAction::New, true) => Err(invalid("new must not reference an existing record")),
            _ if self.is_actionable() && self.candidate.normalized_phone.is_empty() => {
                Err(invalid("phone did not normalize"))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ExistingMatch, ExistingRecord, ImportAction, ImportDecision, NormalizedCandidate,
        RawImportRow,
    };
    use crate::domain::contact::{CallStatus, Contact};
    use crate::domain::ids::ContactId;
    use crate::domain::phone::PhoneNormalizer;

    fn candidate(name: &str) -> NormalizedCandidate {
        NormalizedCandidate {
            raw: RawImportRow {
                name: name.to_string(),
                phone: "050-1234567".to_string(),
                group: None,
                source_sheet: "תלמידים".to_string(),
            },
            normalized_phone: "+972501234567".to_string(),
        }
    }

    fn existing() -> ExistingMatch {
        ExistingMatch {
            id: ContactId::new(),
            name: "David Cohen".to_string(),
        }
    }

    #[test]
    fn toggle_restores_new_for_unmatched_rows() {
        let mut decision = ImportDecision::new_contact(candidate("Dana"));
        assert_eq!(decision.toggle(), ImportAction::Skip);
        assert_eq!(decision.toggle(), ImportAction::New);
    }

    #[test]
    fn toggle_restores_merge_for_matched_rows() {
        let mut decision = ImportDecision::matched(candidate("Dudu Cohen"), existing(), false);
        assert_eq!(decision.toggle(), ImportAction::Skip);
        assert_eq!(decision.toggle(), ImportAction::Merge);
        decision.validate().expect("valid after toggling");
    }

    #[test]
    fn skipped_exact_duplicates_toggle_to_merge() {
        let mut decision = ImportDecision::matched(candidate("David Cohen"), existing(), true);
        assert_eq!(decision.action, ImportAction::Skip);
        assert_eq!(decision.toggle(), ImportAction::Merge);
    }

    #[test]
    fn validate_rejects_inconsistent_actions() {
        let mut merge_without_match = ImportDecision::new_contact(candidate("Dana"));
        merge_without_match.action = ImportAction::Merge;
        assert!(merge_without_match.validate().is_err());

        let mut new_with_match = ImportDecision::matched(candidate("Dana"), existing(), false);
        new_with_match.action = ImportAction::New;
        assert!(new_with_match.validate().is_err());
    }

    #[test]
    fn existing_record_projection_normalizes_both_phones() {
        let contact = Contact {
            id: ContactId::new(),
            full_name: "David Cohen".to_string(),
            first_name: "David".to_string(),
            last_name: "Cohen".to_string(),
            phone_e164: Some("+972532594826".to_string()),
            phone_raw: Some("054-3200050".to_string()),
            call_status: CallStatus::NotChecked,
            source: None,
            created_at: 0,
            updated_at: 0,
        };
        let record = ExistingRecord::from_contact(&contact, &PhoneNormalizer::default());
        assert_eq!(record.normalized_phone1, "+972532594826");
        assert_eq!(record.normalized_phone2, "+972543200050");
    }

    #[test]
    fn action_parses_case_insensitively() {
        assert_eq!("MERGE".parse::<ImportAction>().unwrap(), ImportAction::Merge);
        assert!("later".parse::<ImportAction>().is_err());
    }
}
