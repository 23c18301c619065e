use itertools::Itertools;
use serde_json::Value;

/// Converts a payload value to a trimmed string.
///
/// Returns `None` for null, empty containers and anything whose string form
/// is empty, so the result doubles as the "is this value present" check.
///
/// # Arguments
///
/// * `value` - The JSON value to stringify
pub fn clean_value(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Object(map) if map.is_empty() => return None,
        Value::Array(items) if items.iter().all(is_scalar) => {
            items.iter().filter_map(clean_value).join(", ")
        }
        other => other.to_string(),
    };

    if text.is_empty() { None } else { Some(text) }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

/// Trims the input and collapses every internal whitespace run to one space.
pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().join(" ")
}

/// Returns the leading four-digit year of a date string, if it has one.
///
/// `"2024-09-01"` yields `Some("2024")`; `"Sept 2024"` and `"24"` yield `None`.
pub fn year_prefix(date: &str) -> Option<&str> {
    date.trim()
        .get(..4)
        .filter(|prefix| prefix.bytes().all(|b| b.is_ascii_digit()))
}
