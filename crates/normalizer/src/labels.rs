use serde_json::Value;

/// True when the issue's *first* label carries exactly `target_description`.
///
/// Labels in later positions are ignored. Any unexpected shape (no `labels`
/// key, a non-array, an empty array, a non-object first entry, a missing or
/// non-string description) is a non-match rather than an error.
pub fn is_label_match(issue: &Value, target_description: &str) -> bool {
    let Some(Value::Array(labels)) = issue.get("labels") else {
        return false;
    };
    let Some(Value::Object(first)) = labels.first() else {
        return false;
    };
    first.get("description").and_then(Value::as_str) == Some(target_description)
}
