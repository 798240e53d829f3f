use serde_json::{Map, Value};
use crate::models::Issue;
use super::aliases::{field, first_str, FieldAliases};

/// An issue entry as it appears in raw pipeline output.
#[derive(Debug, Clone, PartialEq)]
pub enum RawIssue {
    Text(String),
    Fields(Map<String, Value>),
    Other(Value),
}

impl From<Value> for RawIssue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => RawIssue::Text(s),
            Value::Object(obj) => RawIssue::Fields(obj),
            other => RawIssue::Other(other),
        }
    }
}

impl RawIssue {
    /// Resolve into a canonical [`Issue`]. Only `null` entries are dropped.
    pub fn resolve(&self, aliases: &FieldAliases, number: u32) -> Option<Issue> {
        match self {
            RawIssue::Text(s) => Some(Issue {
                number,
                issue: s.trim().to_string(),
                ..Default::default()
            }),
            RawIssue::Fields(obj) => Some(resolve_fields(obj, aliases, number)),
            RawIssue::Other(Value::Null) => None,
            RawIssue::Other(v) => Some(Issue {
                number,
                issue: v.to_string(),
                ..Default::default()
            }),
        }
    }
}

pub(crate) fn resolve_fields(obj: &Map<String, Value>, aliases: &FieldAliases, number: u32) -> Issue {
    Issue {
        number,
        issue: issue_text(obj, aliases),
        location: location(obj, aliases),
        impact: field(obj, aliases.impact),
        expected: field(obj, aliases.expected),
        actual: field(obj, aliases.actual),
        fix_priority: field(obj, aliases.fix_priority),
        severity: field(obj, aliases.severity),
    }
}

fn issue_text(obj: &Map<String, Value>, aliases: &FieldAliases) -> String {
    if let Some(text) = first_str(obj, aliases.issue_text) {
        return text.to_string();
    }
    let parts: Vec<&str> = obj
        .values()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        Value::Object(obj.clone()).to_string()
    } else {
        parts.join("; ")
    }
}

fn location(obj: &Map<String, Value>, aliases: &FieldAliases) -> String {
    if let Some(loc) = first_str(obj, aliases.location) {
        return loc.to_string();
    }
    match obj.get("line").and_then(Value::as_i64) {
        Some(line) => format!("Line {}", line),
        None => String::new(),
    }
}
