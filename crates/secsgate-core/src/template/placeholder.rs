//! `{{key}}` placeholder substitution over arbitrary JSON trees.
//!
//! Rules:
//! - Only a string that is *entirely* a token (`{{key}}`, optional whitespace
//!   inside the braces) is a placeholder. There is no interpolation inside
//!   larger strings.
//! - A resolved placeholder is replaced by the table value as-is, so a string
//!   leaf may become a number, array, or object.
//! - Unknown keys leave the token untouched. Completeness is checked separately
//!   with [`find_placeholders`].

use std::collections::BTreeSet;

use serde_json::{Map, Value};

/// Placeholder values keyed by token name (case-sensitive).
pub type ValueTable = Map<String, Value>;

/// Extract the key if `s` is exactly one placeholder token.
pub fn placeholder_key(s: &str) -> Option<&str> {
    let inner = s.strip_prefix("{{")?.strip_suffix("}}")?;
    let key = inner.trim();
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    valid.then_some(key)
}

/// Return a new tree with every resolvable placeholder replaced.
///
/// The input is never mutated and the output shares nothing with it.
pub fn substitute(template: &Value, values: &ValueTable) -> Value {
    match template {
        Value::String(s) => match placeholder_key(s).and_then(|k| values.get(k)) {
            Some(v) => v.clone(),
            None => Value::String(s.clone()),
        },
        Value::Array(items) => Value::Array(items.iter().map(|v| substitute(v, values)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute(v, values)))
                .collect(),
        ),
        scalar => scalar.clone(),
    }
}

/// Collect every placeholder key referenced anywhere in the tree.
pub fn find_placeholders(template: &Value) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    collect(template, &mut out);
    out
}

fn collect(node: &Value, out: &mut BTreeSet<String>) {
    match node {
        Value::String(s) => {
            if let Some(k) = placeholder_key(s) {
                out.insert(k.to_owned());
            }
        }
        Value::Array(items) => items.iter().for_each(|v| collect(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect(v, out)),
        _ => {}
    }
}

/// Keys from `required` that have no entry in `values`, sorted.
pub fn missing_keys(required: &BTreeSet<String>, values: &ValueTable) -> Vec<String> {
    required
        .iter()
        .filter(|k| !values.contains_key(k.as_str()))
        .cloned()
        .collect()
}
