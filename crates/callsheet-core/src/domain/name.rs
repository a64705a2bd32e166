/// Whether a contact-name cell holds a real person's name.
///
/// Messaging exports synthesize names when a contact has none: `w 050...`
/// style placeholders, or the phone number itself. Those rows must not turn
/// into contacts with fake names.
pub fn is_real_name(name: &str) -> bool {
    let trimmed = name.trim();
    if trimmed.chars().count() <= 1 {
        return false;
    }
    !is_placeholder_name(trimmed) && !is_phone_shaped(trimmed)
}

fn is_placeholder_name(value: &str) -> bool {
    let mut chars = value.chars().peekable();
    if !matches!(chars.next(), Some('w' | 'W')) {
        return false;
    }
    let mut saw_space = false;
    while let Some(ch) = chars.peek() {
        if !ch.is_whitespace() {
            break;
        }
        saw_space = true;
        chars.next();
    }
    saw_space && chars.next().is_some_and(|ch| ch.is_ascii_digit())
}

fn is_phone_shaped(value: &str) -> bool {
    let rest = value.strip_prefix('+').unwrap_or(value);
    let mut chars = rest.chars();
    if !chars.next().is_some_and(|ch| ch.is_ascii_digit() || ch == '(') {
        return false;
    }
    let tail = chars.as_str();
    !tail.is_empty()
        && rest.chars().any(|ch| ch.is_ascii_digit())
        && tail
            .chars()
            .all(|ch| ch.is_ascii_digit() || ch.is_whitespace() || matches!(ch, '-' | '(' | ')'))
}

/// First whitespace-separated token is the first name, the remainder the last name.
pub fn split_full_name(full_name: &str) -> (String, String) {
    let mut parts = full_name.split_whitespace();
    let first = parts.next().unwrap_or_default().to_string();
    let last = parts.collect::<Vec<_>>().join(" ");
    (first, last)
}

/// Comparison form of a name: trimmed, inner whitespace collapsed, lowercased.
pub fn normalize_name_for_match(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn names_equivalent(a: &str, b: &str) -> bool {
    normalize_name_for_match(a) == normalize_name_for_match(b)
}

#[cfg(test)]
mod tests {
    use super::{is_real_name, names_equivalent, split_full_name};

    #[test]
    fn rejects_empty_and_single_characters() {
        assert!(!is_real_name(""));
        assert!(!is_real_name("   "));
        assert!(!is_real_name("א"));
        assert!(!is_real_name(" x "));
    }

    #[test]
    fn rejects_export_placeholders() {
        assert!(!is_real_name("w 0501234567"));
        assert!(!is_real_name("W  13477704511"));
        assert!(is_real_name("w abc"));
        assert!(is_real_name("Walter 5"));
    }

    #[test]
    fn rejects_phone_numbers_as_names() {
        assert!(!is_real_name("0501234567"));
        assert!(!is_real_name("+972 50-123-4567"));
        assert!(!is_real_name("(050) 1234567"));
        assert!(!is_real_name("+1 (347) 770-4511"));
        assert!(!is_real_name("(03) 555-1234"));
    }

    #[test]
    fn parenthesised_text_is_still_a_name() {
        assert!(is_real_name("(Dana) Levi"));
    }

    #[test]
    fn accepts_ordinary_names() {
        assert!(is_real_name("David Cohen"));
        assert!(is_real_name("דוגמה אחת"));
        assert!(is_real_name("Li"));
        assert!(is_real_name("Room 101"));
    }

    #[test]
    fn split_takes_first_token_as_first_name() {
        assert_eq!(
            split_full_name("David  Ben Cohen"),
            ("David".to_string(), "Ben Cohen".to_string())
        );
        assert_eq!(split_full_name("Madonna"), ("Madonna".to_string(), String::new()));
        assert_eq!(split_full_name("  "), (String::new(), String::new()));
    }

    #[test]
    fn name_equivalence_folds_case_and_spacing() {
        assert!(names_equivalent("David Cohen", " david  cohen "));
        assert!(!names_equivalent("David Cohen", "Dudu Cohen"));
    }
}
