//! Internal helpers for input validation and normalization.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation so every operation enforces the same invariants.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::{EngineError, ResultEngine};

/// Trim a mandatory text field, failing when nothing is left.
pub(crate) fn normalize_required_text(value: &str, field: &'static str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::invalid(field, format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field, mapping blank input to `None`.
pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Fold a free-form label into an enum key: strips accents, uppercases and
/// turns runs of spaces, dashes or underscores into a single `_`.
///
/// `"  entertainment "` and `"Éntertainment"` both become `ENTERTAINMENT`.
pub(crate) fn normalize_enum_key(input: &str) -> Option<String> {
    let mut out = String::new();
    let mut pending_sep = false;
    for ch in input.trim().nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            for upper in ch.to_uppercase() {
                out.push(upper);
            }
        } else {
            pending_sep = true;
        }
    }
    if out.is_empty() { None } else { Some(out) }
}
