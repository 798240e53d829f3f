use std::sync::LazyLock;
use regex::Regex;
use serde_json::Value;

static BRACKET_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\[.*\]").expect("valid bracket regex")
});

/// Pull the JSON array out of raw stage output.
///
/// Tries the whole trimmed text first, then the greedy span from the first `[`
/// to the last `]`. Returns `None` unless the result is a non-empty array.
pub fn extract_array(raw: &str) -> Option<Vec<Value>> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    let parsed = match serde_json::from_str::<Value>(text) {
        Ok(v) => Some(v),
        Err(_) => BRACKET_SPAN
            .find(text)
            .and_then(|m| serde_json::from_str::<Value>(m.as_str()).ok()),
    };

    match parsed {
        Some(Value::Array(items)) if !items.is_empty() => Some(items),
        _ => None,
    }
}
