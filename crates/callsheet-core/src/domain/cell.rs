use serde::{Deserialize, Serialize};
use std::fmt;

/// A single spreadsheet cell as delivered by a tabular source.
///
/// Numeric cells matter for phone columns: spreadsheet tools store
/// `0502171103` as the number `502171103`, dropping the trunk zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Number(value) => !value.is_finite(),
            CellValue::Text(value) => value.trim().is_empty(),
        }
    }

    /// Trimmed textual rendering, `None` for blank cells.
    pub fn to_text(&self) -> Option<String> {
        if self.is_blank() {
            return None;
        }
        match self {
            CellValue::Empty => None,
            CellValue::Number(value) => Some(format_number(*value)),
            CellValue::Text(value) => Some(value.trim().to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_text() {
            Some(text) => f.write_str(&text),
            None => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

// Integral floats below 2^53 are exact, so they render without a fraction.
fn format_number(value: f64) -> String {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if value.fract() == 0.0 && value.abs() < MAX_EXACT {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::CellValue;

    #[test]
    fn integral_numbers_render_without_fraction() {
        assert_eq!(
            CellValue::Number(502171103.0).to_text().as_deref(),
            Some("502171103")
        );
        assert_eq!(CellValue::Number(1.5).to_text().as_deref(), Some("1.5"));
    }

    #[test]
    fn blank_cells_have_no_text() {
        assert!(CellValue::Empty.to_text().is_none());
        assert!(CellValue::text("   ").to_text().is_none());
        assert!(CellValue::Number(f64::NAN).to_text().is_none());
    }

    #[test]
    fn text_is_trimmed() {
        assert_eq!(CellValue::text("  Dana ").to_text().as_deref(), Some("Dana"));
    }
}
