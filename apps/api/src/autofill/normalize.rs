//! Register data → reconciler input.

use serde_json::Value;

use crate::models::profile::ProfileData;

/// Raw register key (matched lower-cased) → category key.
const KEY_MAP: &[(&str, &str)] = &[
    ("name", "FullName"),
    ("full_name", "FullName"),
    ("email", "email"),
    ("phone", "phone"),
    ("github", "github"),
    ("linkedin", "linkedin"),
    ("domain", "domainSpecialization"),
    ("specialization", "domainSpecialization"),
    ("skills", "skills"),
    ("experience", "experience"),
];

/// Remaps known keys; anything unmapped passes through untouched.
/// Non-object input normalizes to nothing.
pub fn normalize_profile(raw: &Value) -> ProfileData {
    let Some(object) = raw.as_object() else {
        return ProfileData::new();
    };

    object
        .iter()
        .map(|(key, value)| {
            let lower = key.to_lowercase();
            let mapped = KEY_MAP
                .iter()
                .find(|(from, _)| *from == lower)
                .map_or(key.as_str(), |(_, to)| *to);
            (mapped.to_string(), value.clone())
        })
        .collect()
}

/// Text to write for `value`, or `None` when there is nothing worth filling.
///
/// Non-empty strings, non-zero numbers, `true`, and non-empty arrays
/// (comma-joined) are fillable.
pub fn fillable_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64().is_some_and(|f| f != 0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        Value::Array(items) if !items.is_empty() => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
        ),
        _ => None,
    }
}
