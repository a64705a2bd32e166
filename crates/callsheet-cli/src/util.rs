use anyhow::{anyhow, Result};
use callsheet_core::domain::ContactId;
use chrono::{Local, NaiveDate, Utc};
use std::str::FromStr;

pub fn now_utc() -> i64 {
    Utc::now().timestamp()
}

/// Calendar day in the operator's timezone; names backup files.
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

pub fn parse_contact_id(raw: &str) -> Result<ContactId> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("contact id cannot be empty"));
    }
    ContactId::from_str(trimmed).map_err(|_| anyhow!("invalid contact id"))
}

/// Keeps review output to one line per row.
pub fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut out: String = value.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}
