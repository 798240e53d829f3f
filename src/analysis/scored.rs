use std::collections::{BTreeMap, HashMap};
use serde_json::{Map, Value};
use crate::models::{FileAnalysis, Issue, Severity};
use super::aliases::{field, first_str, to_f64, FieldAliases};
use super::issue::RawIssue;

/// Group per-file scored entries, merging repeated mentions of the same file.
pub fn transform(items: &[Value], aliases: &FieldAliases) -> Vec<FileAnalysis> {
    let mut files: Vec<FileAnalysis> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for obj in items.iter().filter_map(Value::as_object) {
        let Some(path) = first_str(obj, aliases.file_path) else {
            continue;
        };
        let entry = parse_entry(path, obj, aliases);

        match index.get(path) {
            Some(&i) => merge(&mut files[i], entry),
            None => {
                index.insert(path.to_string(), files.len());
                files.push(entry);
            }
        }
    }

    files
}

fn parse_entry(path: &str, obj: &Map<String, Value>, aliases: &FieldAliases) -> FileAnalysis {
    let severity = first_str(obj, aliases.severity)
        .map(Severity::parse_lenient)
        .unwrap_or_default();

    let issues: Vec<Issue> = match obj.get("issues") {
        Some(Value::Array(raw)) => raw
            .iter()
            .cloned()
            .map(RawIssue::from)
            .filter_map(|r| r.resolve(aliases, 0))
            .enumerate()
            .map(|(i, mut issue)| {
                issue.number = i as u32 + 1;
                issue
            })
            .collect(),
        _ => Vec::new(),
    };

    let mut entry = FileAnalysis::new(path);
    entry.doc_type = field(obj, aliases.doc_type);
    entry.severity = severity;
    entry.freshness_score = to_f64(obj.get("freshness_score"));
    entry.confidence = to_f64(obj.get("confidence"));
    entry.score_breakdown = breakdown(obj, aliases);
    entry.issues = issues;
    entry.recommendations = recommendations(obj.get("recommendations"));
    entry
}

fn breakdown(obj: &Map<String, Value>, aliases: &FieldAliases) -> BTreeMap<String, f64> {
    aliases
        .breakdown
        .iter()
        .filter_map(|k| obj.get(*k).and_then(Value::as_object))
        .find(|m| !m.is_empty())
        .map(|m| m.iter().map(|(k, v)| (k.clone(), to_f64(Some(v)))).collect())
        .unwrap_or_default()
}

fn recommendations(value: Option<&Value>) -> Vec<String> {
    let raw: Vec<String> = match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        _ => Vec::new(),
    };
    raw.into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn merge(existing: &mut FileAnalysis, incoming: FileAnalysis) {
    if incoming.severity.rank() > existing.severity.rank() {
        existing.severity = incoming.severity;
    }
    if existing.freshness_score == 0.0 && incoming.freshness_score != 0.0 {
        existing.freshness_score = incoming.freshness_score;
    }
    if existing.confidence == 0.0 && incoming.confidence != 0.0 {
        existing.confidence = incoming.confidence;
    }
    if existing.doc_type.is_empty() {
        existing.doc_type = incoming.doc_type;
    }
    if existing.score_breakdown.is_empty() {
        existing.score_breakdown = incoming.score_breakdown;
    }

    let offset = existing.issues.len() as u32;
    for (i, mut issue) in incoming.issues.into_iter().enumerate() {
        issue.number = offset + i as u32 + 1;
        existing.issues.push(issue);
    }

    for rec in incoming.recommendations {
        if !existing.recommendations.contains(&rec) {
            existing.recommendations.push(rec);
        }
    }
}
