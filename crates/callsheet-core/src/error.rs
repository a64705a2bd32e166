use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("full name is required")]
    EmptyFullName,
    #[error("invalid tag name")]
    InvalidTagName,
    #[error("unknown call status: {0}")]
    InvalidCallStatus(String),
    #[error("invalid column reference: {0}")]
    InvalidColumnRef(String),
    #[error("invalid sheet schema for {sheet}: {reason}")]
    InvalidSheetSchema { sheet: String, reason: String },
    #[error("invalid sheet alias {alias}: {reason}")]
    InvalidSheetAlias { alias: String, reason: String },
    #[error("invalid numbering plan: {0}")]
    InvalidNumberingPlan(String),
    #[error("inconsistent import decision for {name}: {reason}")]
    InconsistentDecision { name: String, reason: &'static str },
}
