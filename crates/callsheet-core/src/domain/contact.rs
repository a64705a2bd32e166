use crate::domain::ids::ContactId;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome of the most recent outreach call to a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    #[default]
    NotChecked,
    NoAnswer,
    CallLater,
    Agreed,
    Refused,
    Donated,
    FollowUp,
}

impl CallStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            CallStatus::NotChecked => "not_checked",
            CallStatus::NoAnswer => "no_answer",
            CallStatus::CallLater => "call_later",
            CallStatus::Agreed => "agreed",
            CallStatus::Refused => "refused",
            CallStatus::Donated => "donated",
            CallStatus::FollowUp => "follow_up",
        }
    }

    pub const fn all() -> &'static [CallStatus] {
        &[
            CallStatus::NotChecked,
            CallStatus::NoAnswer,
            CallStatus::CallLater,
            CallStatus::Agreed,
            CallStatus::Refused,
            CallStatus::Donated,
            CallStatus::FollowUp,
        ]
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallStatus {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        CallStatus::all()
            .iter()
            .copied()
            .find(|status| status.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| CoreError::InvalidCallStatus(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_e164: Option<String>,
    pub phone_raw: Option<String>,
    pub call_status: CallStatus,
    pub source: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Contact {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.full_name.trim().is_empty() {
            return Err(CoreError::EmptyFullName);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::CallStatus;
    use std::str::FromStr;

    #[test]
    fn call_status_parse_round_trip() {
        for status in CallStatus::all() {
            let parsed = CallStatus::from_str(status.as_str()).expect("parse status");
            assert_eq!(*status, parsed);
        }
    }

    #[test]
    fn call_status_parse_ignores_case_and_padding() {
        assert_eq!(
            CallStatus::from_str(" Call_Later ").unwrap(),
            CallStatus::CallLater
        );
        assert!(CallStatus::from_str("maybe").is_err());
    }
}
