use crate::domain::cell::CellValue;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_COUNTRY_CODE: &str = "972";
pub const DEFAULT_MOBILE_PREFIX: char = '5';
pub const DEFAULT_MIN_PHONE_DIGITS: usize = 9;

const LOCAL_MOBILE_DIGITS: usize = 10;
const SUBSCRIBER_DIGITS: usize = 9;
const INTERNATIONAL_MIN_DIGITS: usize = 10;
const NANP_MIN_DIGITS: usize = 11;

/// Canonicalizes free-text phone values for one country's numbering plan.
///
/// `normalize` is total: it never fails, and values it cannot classify come
/// back as bare digits (possibly empty). It is also idempotent, so stored
/// values that were normalized earlier compare equal to fresh input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNormalizer {
    country_code: String,
    mobile_prefix: char,
}

impl Default for PhoneNormalizer {
    fn default() -> Self {
        Self {
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            mobile_prefix: DEFAULT_MOBILE_PREFIX,
        }
    }
}

impl PhoneNormalizer {
    pub fn new(country_code: &str, mobile_prefix: char) -> Result<Self, CoreError> {
        let country_code = country_code.trim().trim_start_matches('+');
        if country_code.is_empty()
            || country_code.len() > 3
            || !country_code.chars().all(|ch| ch.is_ascii_digit())
        {
            return Err(CoreError::InvalidNumberingPlan(format!(
                "country code must be 1-3 digits, got {country_code:?}"
            )));
        }
        if !mobile_prefix.is_ascii_digit() || mobile_prefix == '0' {
            return Err(CoreError::InvalidNumberingPlan(format!(
                "mobile prefix must be a digit 1-9, got {mobile_prefix:?}"
            )));
        }
        Ok(Self {
            country_code: country_code.to_string(),
            mobile_prefix,
        })
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    pub fn mobile_prefix(&self) -> char {
        self.mobile_prefix
    }

    pub fn normalize(&self, raw: &str) -> String {
        let mut phone = raw.trim();
        if let Some(rest) = phone.strip_prefix('=') {
            phone = rest;
        }
        let has_plus = phone.starts_with('+');
        let mut digits: String = phone.chars().filter(|ch| ch.is_ascii_digit()).collect();

        // Numeric spreadsheet cells lose the trunk zero of local mobiles.
        if digits.len() == SUBSCRIBER_DIGITS && digits.starts_with(self.mobile_prefix) {
            digits.insert(0, '0');
        }

        if digits.len() == LOCAL_MOBILE_DIGITS && self.is_local_mobile(&digits) {
            return format!("+{}{}", self.country_code, &digits[1..]);
        }

        if digits.len() == self.country_code.len() + SUBSCRIBER_DIGITS
            && self.is_international_mobile(&digits)
        {
            return format!("+{digits}");
        }

        if has_plus && digits.len() >= INTERNATIONAL_MIN_DIGITS {
            return format!("+{digits}");
        }

        if digits.starts_with('1') && digits.len() >= NANP_MIN_DIGITS {
            return format!("+{digits}");
        }

        if digits.len() >= INTERNATIONAL_MIN_DIGITS {
            return format!("+{digits}");
        }

        digits
    }

    pub fn normalize_cell(&self, cell: &CellValue) -> String {
        match cell.to_text() {
            Some(text) => self.normalize(&text),
            None => String::new(),
        }
    }

    /// Normalized value usable as a matching key, or `None` when the value is
    /// empty or carries fewer than `min_digits` digits.
    pub fn match_key(&self, raw: &str, min_digits: usize) -> Option<String> {
        let normalized = self.normalize(raw);
        let digit_count = normalized.trim_start_matches('+').len();
        if normalized.is_empty() || digit_count < min_digits.max(1) {
            return None;
        }
        Some(normalized)
    }

    pub fn phones_match(&self, a: &str, b: &str) -> bool {
        let a = self.normalize(a);
        let b = self.normalize(b);
        !a.is_empty() && a == b
    }

    fn is_local_mobile(&self, digits: &str) -> bool {
        let mut chars = digits.chars();
        chars.next() == Some('0') && chars.next() == Some(self.mobile_prefix)
    }

    fn is_international_mobile(&self, digits: &str) -> bool {
        digits
            .strip_prefix(self.country_code.as_str())
            .is_some_and(|rest| rest.starts_with(self.mobile_prefix))
    }
}

pub fn normalize_phone(raw: &str) -> String {
    PhoneNormalizer::default().normalize(raw)
}
