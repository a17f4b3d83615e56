//! Name heuristics applied to profile display names.
//!
//! Both helpers assume a "first ... last" ordering. That is wrong for many
//! naming conventions and is kept as-is because downstream tables are keyed
//! on exactly this split.

/// First whitespace-separated token of `name`, or `""` when there is none.
pub fn split_first_name(name: Option<&str>) -> String {
    name.and_then(|n| n.split_whitespace().next())
        .unwrap_or_default()
        .to_string()
}

/// Last whitespace-separated token of `name`, or `""` when there is none.
pub fn split_last_name(name: Option<&str>) -> String {
    name.and_then(|n| n.split_whitespace().next_back())
        .unwrap_or_default()
        .to_string()
}

/// Treats empty and whitespace-only strings as unset.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
