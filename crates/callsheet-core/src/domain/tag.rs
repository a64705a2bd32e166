use crate::domain::ids::TagId;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};

/// Category label name. Sheet names become tag names, so the rule has to
/// keep non-Latin scripts intact while folding ASCII case and spacing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TagName(String);

impl TagName {
    pub fn new(raw: &str) -> Result<Self, CoreError> {
        let normalized = normalize_tag_name(raw)?;
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TagName {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<TagName> for String {
    fn from(value: TagName) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: TagName,
}

pub fn normalize_tag_name(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidTagName);
    }

    let mut out = String::with_capacity(trimmed.len());
    let mut prev_dash = false;
    for ch in trimmed.chars() {
        let mapped = if ch.is_whitespace() { '-' } else { ch };
        if mapped == '-' {
            if !prev_dash {
                out.push('-');
            }
            prev_dash = true;
            continue;
        }
        prev_dash = false;
        out.push(mapped.to_ascii_lowercase());
    }

    let out = out.trim_matches('-');
    if out.is_empty() {
        return Err(CoreError::InvalidTagName);
    }
    Ok(out.to_string())
}

#[cfg(test)]
mod tests {
    use super::{normalize_tag_name, TagName};

    #[test]
    fn sheet_names_keep_hebrew_and_fold_spaces() {
        assert_eq!(normalize_tag_name(" נצור לשונך ").unwrap(), "נצור-לשונך");
    }

    #[test]
    fn underscores_are_kept_apart_from_spaces() {
        assert_eq!(normalize_tag_name("Donors_2024").unwrap(), "donors_2024");
        assert_ne!(
            normalize_tag_name("a_b").unwrap(),
            normalize_tag_name("a b").unwrap()
        );
    }

    #[test]
    fn ascii_is_lowercased_and_dashes_collapse() {
        assert_eq!(normalize_tag_name("Donors   2024").unwrap(), "donors-2024");
        assert_eq!(normalize_tag_name("- Friends -").unwrap(), "friends");
    }

    #[test]
    fn blank_and_dash_only_names_are_rejected() {
        assert!(normalize_tag_name("   ").is_err());
        assert!(normalize_tag_name(" - - ").is_err());
        assert!(TagName::try_from(String::new()).is_err());
    }
}
