//! Phone number normalization
//!
//! Affiliation lookups compare phone numbers by exact string equality, so
//! every phone is normalized before it is written or queried.

/// Normalize a phone number for storage and lookup
///
/// Strips whitespace and the separators `-`, `.`, `(`, `)`; a leading `00`
/// international prefix becomes `+`. Returns `None` when nothing dialable
/// remains.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let mut compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '.' | '(' | ')'))
        .collect();

    if let Some(rest) = compact.strip_prefix("00") {
        compact = format!("+{}", rest);
    }

    let digits = compact.strip_prefix('+').unwrap_or(&compact);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    Some(compact)
}
