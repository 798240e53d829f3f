use serde_json::{Map, Value};

/// Ordered key aliases for each logical field of pipeline output.
///
/// Upstream stages are free to name fields however they like; lookups walk each
/// list front to back and take the first non-empty string.
#[derive(Debug, Clone, Copy)]
pub struct FieldAliases {
    pub file_path: &'static [&'static str],
    pub doc_type: &'static [&'static str],
    pub issue_text: &'static [&'static str],
    pub location: &'static [&'static str],
    pub impact: &'static [&'static str],
    pub expected: &'static [&'static str],
    pub actual: &'static [&'static str],
    pub fix_priority: &'static [&'static str],
    pub severity: &'static [&'static str],
    pub breakdown: &'static [&'static str],
}

pub const DEFAULT_ALIASES: FieldAliases = FieldAliases {
    file_path: &["file_path", "file", "path"],
    doc_type: &["doc_type", "type", "category", "kind"],
    issue_text: &[
        "issue_name", "description", "issue", "problem", "finding", "title",
        "message", "detail", "text", "name", "summary", "msg",
    ],
    location: &["location", "line"],
    impact: &["impact", "why_it_matters", "reason"],
    expected: &["expected", "what_docs_say", "documented"],
    actual: &["actual", "what_code_does", "reality"],
    fix_priority: &["fix_priority", "priority"],
    severity: &["severity"],
    breakdown: &["score_breakdown", "components"],
};

impl Default for FieldAliases {
    fn default() -> Self {
        DEFAULT_ALIASES
    }
}

/// First non-blank string value among `keys`, trimmed.
pub fn first_str<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| obj.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// Like [`first_str`] but yields an owned, possibly empty string.
pub fn field(obj: &Map<String, Value>, keys: &[&str]) -> String {
    first_str(obj, keys).unwrap_or_default().to_string()
}

/// Lenient float coercion: numbers and numeric strings convert, everything else is 0.0.
pub fn to_f64(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_first_str_respects_alias_order() {
        let o = obj(json!({"file": "b.py", "file_path": "a.py"}));
        assert_eq!(first_str(&o, DEFAULT_ALIASES.file_path), Some("a.py"));
    }

    #[test]
    fn test_first_str_skips_blank_and_non_string() {
        let o = obj(json!({"file_path": "  ", "file": 42, "path": " c.py "}));
        assert_eq!(first_str(&o, DEFAULT_ALIASES.file_path), Some("c.py"));
    }

    #[test]
    fn test_to_f64_coercion() {
        assert_eq!(to_f64(Some(&json!(42.5))), 42.5);
        assert_eq!(to_f64(Some(&json!("17"))), 17.0);
        assert_eq!(to_f64(Some(&json!("n/a"))), 0.0);
        assert_eq!(to_f64(Some(&json!(null))), 0.0);
        assert_eq!(to_f64(Some(&json!([1]))), 0.0);
        assert_eq!(to_f64(Some(&json!("NaN"))), 0.0);
        assert_eq!(to_f64(None), 0.0);
    }
}
