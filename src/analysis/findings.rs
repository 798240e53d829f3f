use std::collections::HashMap;
use serde_json::{Map, Value};
use crate::models::{FileAnalysis, Severity};
use crate::utils::round_to;
use super::aliases::{field, first_str, FieldAliases};
use super::issue::resolve_fields;

const CRITICAL_PENALTY: f64 = 35.0;
const MAJOR_PENALTY: f64 = 10.0;
const MINOR_PENALTY: f64 = 4.0;
const SYNTHESIZED_CONFIDENCE: f64 = 0.7;

/// Turn one-row-per-issue output into per-file analyses with synthesized scores.
pub fn transform(items: &[Value], aliases: &FieldAliases) -> Vec<FileAnalysis> {
    let mut order: Vec<String> = Vec::new();
    let mut rows: HashMap<String, Vec<&Map<String, Value>>> = HashMap::new();

    for obj in items.iter().filter_map(Value::as_object) {
        let Some(path) = first_str(obj, aliases.file_path) else {
            continue;
        };
        rows.entry(path.to_string())
            .or_insert_with(|| {
                order.push(path.to_string());
                Vec::new()
            })
            .push(obj);
    }

    order
        .into_iter()
        .map(|path| {
            let file_rows = rows.remove(&path).unwrap_or_default();
            build_file(&path, &file_rows, aliases)
        })
        .collect()
}

fn build_file(path: &str, rows: &[&Map<String, Value>], aliases: &FieldAliases) -> FileAnalysis {
    let (mut critical, mut major, mut minor) = (0u32, 0u32, 0u32);
    let mut file = FileAnalysis::new(path);

    for (i, row) in rows.iter().enumerate() {
        let severity = first_str(row, aliases.severity)
            .map(Severity::parse_lenient)
            .unwrap_or_default();
        match severity {
            Severity::Critical => critical += 1,
            Severity::Major => major += 1,
            Severity::Minor => minor += 1,
        }
        if file.doc_type.is_empty() {
            file.doc_type = field(row, aliases.doc_type);
        }
        file.issues.push(resolve_fields(row, aliases, i as u32 + 1));
    }

    file.severity = if critical > 0 {
        Severity::Critical
    } else if major > 0 {
        Severity::Major
    } else {
        Severity::Minor
    };

    let penalty = critical as f64 * CRITICAL_PENALTY
        + major as f64 * MAJOR_PENALTY
        + minor as f64 * MINOR_PENALTY;
    file.freshness_score = round_to((100.0 - penalty).max(0.0), 1);
    file.confidence = SYNTHESIZED_CONFIDENCE;
    file
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::analysis::aliases::DEFAULT_ALIASES;

    fn run(v: Value) -> Vec<FileAnalysis> {
        transform(v.as_array().unwrap(), &DEFAULT_ALIASES)
    }

    #[test]
    fn test_groups_rows_by_file() {
        let files = run(json!([
            {"file_path": "a.py", "severity": "critical", "issue": "x", "doc_type": "docstring"},
            {"file_path": "a.py", "severity": "minor", "issue": "y"},
            {"file_path": "b.md", "severity": "major", "issue": "z", "line": 3}
        ]));
        assert_eq!(files.len(), 2);

        let a = &files[0];
        assert_eq!(a.severity, Severity::Critical);
        assert_eq!(a.freshness_score, 61.0);
        assert_eq!(a.confidence, 0.7);
        assert_eq!(a.doc_type, "docstring");
        assert_eq!(a.issues.iter().map(|i| i.number).collect::<Vec<_>>(), vec![1, 2]);

        let b = &files[1];
        assert_eq!(b.severity, Severity::Major);
        assert_eq!(b.freshness_score, 90.0);
        assert_eq!(b.issues[0].location, "Line 3");
    }

    #[test]
    fn test_score_floors_at_zero() {
        let rows: Vec<Value> = (0..4)
            .map(|_| json!({"file": "bad.py", "severity": "critical", "issue": "x"}))
            .collect();
        let files = transform(&rows, &DEFAULT_ALIASES);
        assert_eq!(files[0].freshness_score, 0.0);
    }

    #[test]
    fn test_unknown_severity_counts_as_minor() {
        let files = run(json!([{"file_path": "a.py", "severity": "weird", "issue": "x"}]));
        assert_eq!(files[0].severity, Severity::Minor);
        assert_eq!(files[0].freshness_score, 96.0);
    }
}
