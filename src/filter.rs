//! Client-side search over already-fetched lists.
//!
//! A row matches when the lowercased search term is a substring of the
//! lowercased string form of any of its attributes. Strings match on their
//! content, numbers and booleans on their display form, nested objects and
//! arrays through their scalar leaves. Nulls never match. The term is used
//! as typed, surrounding spaces included; an empty term keeps every row.

use serde::Serialize;
use serde_json::Value;

/// Rows of `items` matching `term`, in their original order.
#[must_use]
pub fn filter_rows<'a, T: Serialize>(items: &'a [T], term: &str) -> Vec<&'a T> {
    let needle = term.to_lowercase();
    if needle.is_empty() {
        return items.iter().collect();
    }
    items.iter().filter(|item| matches_any_field(*item, &needle)).collect()
}

/// Whether any attribute of `item` contains `needle`. `needle` must already
/// be lowercased.
#[must_use]
pub fn matches_any_field<T: Serialize>(item: &T, needle: &str) -> bool {
    match serde_json::to_value(item) {
        Ok(value) => value_matches(&value, needle),
        Err(e) => {
            tracing::warn!(error = %e, "row not serializable; excluded from search");
            false
        }
    }
}

fn value_matches(value: &Value, needle: &str) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => b.to_string().contains(needle),
        Value::Number(n) => n.to_string().contains(needle),
        Value::String(s) => s.to_lowercase().contains(needle),
        Value::Array(items) => items.iter().any(|v| value_matches(v, needle)),
        Value::Object(map) => map.values().any(|v| value_matches(v, needle)),
    }
}

#[cfg(test)]
#[path = "filter_test.rs"]
mod tests;
