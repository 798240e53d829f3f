use crate::models::{AnalysisReport, FileAnalysis, Severity};
use crate::utils::round_to;

/// Compute report-level aggregates from per-file analyses.
///
/// Issue counts are bucketed by each file's severity, not by the severity of the
/// individual issues.
pub fn summarize(files: Vec<FileAnalysis>) -> AnalysisReport {
    if files.is_empty() {
        return AnalysisReport::empty();
    }

    let (mut critical, mut major, mut minor) = (0u32, 0u32, 0u32);
    let mut score_total = 0.0;
    for file in &files {
        let count = file.issues.len() as u32;
        match file.severity {
            Severity::Critical => critical += count,
            Severity::Major => major += count,
            Severity::Minor => minor += count,
        }
        score_total += file.freshness_score;
    }

    let total = files.len() as u32;
    AnalysisReport {
        total_files: total,
        critical_issues: critical,
        major_issues: major,
        minor_issues: minor,
        average_score: round_to(score_total / total as f64, 2),
        severity: Severity::dominant(critical, major, minor),
        files,
    }
}
