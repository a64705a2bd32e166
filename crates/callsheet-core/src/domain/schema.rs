use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_NAME_HEADERS: &[&str] = &["שם", "name", "full_name"];
pub const DEFAULT_PHONE_HEADERS: &[&str] = &["טלפון", "phone", "phone1"];
pub const DEFAULT_GROUP_HEADERS: &[&str] = &["חבר בקבוצה", "group"];

/// Reference to a sheet column: a header name, or a zero-based position
/// written as `#N`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ColumnRef {
    Header(String),
    Index(usize),
}

impl FromStr for ColumnRef {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidColumnRef(raw.to_string()));
        }
        if let Some(index) = trimmed.strip_prefix('#') {
            return index
                .parse::<usize>()
                .map(ColumnRef::Index)
                .map_err(|_| CoreError::InvalidColumnRef(raw.to_string()));
        }
        Ok(ColumnRef::Header(trimmed.to_string()))
    }
}

impl TryFrom<String> for ColumnRef {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ColumnRef> for String {
    fn from(value: ColumnRef) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Header(name) => f.write_str(name),
            ColumnRef::Index(index) => write!(f, "#{index}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaOrigin {
    /// Built-in header guesses; columns that are absent are ignored.
    Default,
    /// Declared in configuration; every column must exist.
    Configured,
}

/// Field-to-column bindings for one source sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSchema {
    pub sheet: String,
    pub name: Vec<ColumnRef>,
    pub phone: Vec<ColumnRef>,
    pub group: Vec<ColumnRef>,
    pub origin: SchemaOrigin,
}

impl SheetSchema {
    pub fn configured(
        sheet: &str,
        name: Vec<ColumnRef>,
        phone: Vec<ColumnRef>,
        group: Option<ColumnRef>,
    ) -> Result<Self, CoreError> {
        let sheet = sheet.trim();
        let invalid = |reason: &str| CoreError::InvalidSheetSchema {
            sheet: sheet.to_string(),
            reason: reason.to_string(),
        };
        if sheet.is_empty() {
            return Err(invalid("sheet name is empty"));
        }
        if name.is_empty() {
            return Err(invalid("at least one name column is required"));
        }
        if phone.is_empty() {
            return Err(invalid("at least one phone column is required"));
        }
        Ok(Self {
            sheet: sheet.to_string(),
            name,
            phone,
            group: group.into_iter().collect(),
            origin: SchemaOrigin::Configured,
        })
    }

    pub fn default_for(sheet: &str) -> Self {
        let headers = |names: &[&str]| -> Vec<ColumnRef> {
            names
                .iter()
                .map(|name| ColumnRef::Header((*name).to_string()))
                .collect()
        };
        Self {
            sheet: sheet.to_string(),
            name: headers(DEFAULT_NAME_HEADERS),
            phone: headers(DEFAULT_PHONE_HEADERS),
            group: headers(DEFAULT_GROUP_HEADERS),
            origin: SchemaOrigin::Default,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetAlias {
    pub alias: String,
    pub canonical: String,
}

/// Sheet names that carry the same data under another label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetAliases {
    entries: Vec<SheetAlias>,
}

impl Default for SheetAliases {
    fn default() -> Self {
        Self {
            entries: vec![SheetAlias {
                alias: "סיפורי בעש\"ט".to_string(),
                canonical: "נצור לשונך".to_string(),
            }],
        }
    }
}

impl SheetAliases {
    pub fn new(entries: Vec<SheetAlias>) -> Result<Self, CoreError> {
        let mut aliases = HashSet::new();
        let mut cleaned = Vec::with_capacity(entries.len());
        for entry in entries {
            let alias = entry.alias.trim().to_string();
            let canonical = entry.canonical.trim().to_string();
            let invalid = |reason: &str| CoreError::InvalidSheetAlias {
                alias: alias.clone(),
                reason: reason.to_string(),
            };
            if alias.is_empty() || canonical.is_empty() {
                return Err(invalid("alias and canonical names must be non-empty"));
            }
            if alias == canonical {
                return Err(invalid("alias equals its canonical name"));
            }
            if !aliases.insert(alias.clone()) {
                return Err(invalid("alias declared twice"));
            }
            cleaned.push(SheetAlias { alias, canonical });
        }
        for entry in &cleaned {
            if aliases.contains(&entry.canonical) {
                return Err(CoreError::InvalidSheetAlias {
                    alias: entry.canonical.clone(),
                    reason: "name is both an alias and a canonical sheet".to_string(),
                });
            }
        }
        Ok(Self { entries: cleaned })
    }

    pub fn canonical<'a>(&'a self, sheet: &'a str) -> &'a str {
        let trimmed = sheet.trim();
        self.entries
            .iter()
            .find(|entry| entry.alias == trimmed)
            .map(|entry| entry.canonical.as_str())
            .unwrap_or(trimmed)
    }

    pub fn entries(&self) -> &[SheetAlias] {
        &self.entries
    }
}
