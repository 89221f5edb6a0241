//! Field normalization rules
//!
//! Pure functions applied regardless of which source supplied the raw value.

use crate::types::{fields, Metadata};

/// Split an "N/total" value, optionally wrapped in brackets (`[2/10]`)
///
/// Returns `None` unless the value splits into exactly two non-empty parts.
pub fn split_numbered(raw: &str) -> Option<(String, String)> {
    let text: String = raw.chars().filter(|c| *c != '[' && *c != ']').collect();
    let mut parts = text.split('/');
    let number = parts.next()?.trim();
    let total = parts.next()?.trim();
    if parts.next().is_some() || number.is_empty() || total.is_empty() {
        return None;
    }
    Some((number.to_string(), total.to_string()))
}

/// Apply [`split_numbered`] into a number/total field pair
///
/// Nothing is written when the split fails or the number field is already set.
pub fn apply_numbered(metadata: &mut Metadata, raw: &str, number_key: &str, total_key: &str) {
    if metadata.contains(number_key) {
        return;
    }
    if let Some((number, total)) = split_numbered(raw) {
        metadata.insert(number_key, number);
        metadata.insert(total_key, total);
    }
}

/// Join a multi-valued field with `/`, skipping blanks
pub fn join_values<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let parts: Vec<&str> = values
        .into_iter()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Move `from` into `to` when `to` is absent; `from` is always removed
pub fn rename_fallback(metadata: &mut Metadata, from: &str, to: &str) {
    if let Some(value) = metadata.remove(from) {
        metadata.insert_if_absent(to, value);
    }
}

/// Final rules run after recognition: `publisher` to `label`, `year` to `date`
pub fn finalize(metadata: &mut Metadata) {
    rename_fallback(metadata, fields::PUBLISHER, fields::LABEL);
    rename_fallback(metadata, fields::YEAR, fields::DATE);
}
