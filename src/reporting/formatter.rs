use crate::models::{AnalysisReport, FileAnalysis};
use crate::utils::format_score;

pub fn format_file_section(file: &FileAnalysis) -> String {
    let mut out = format!(
        "### {}\n\n**Severity:** {}\n**Freshness:** {}\n**Confidence:** {:.2}\n",
        file.file,
        file.severity,
        format_score(file.freshness_score),
        file.confidence,
    );
    if !file.doc_type.is_empty() {
        out.push_str(&format!("**Doc type:** {}\n", file.doc_type));
    }

    if file.issues.is_empty() {
        out.push_str("\nNo issues found.\n");
    } else {
        out.push_str("\n| # | Issue | Location | Severity | Priority |\n|---|---|---|---|---|\n");
        for issue in &file.issues {
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                issue.number,
                escape_cell(&issue.issue),
                escape_cell(&issue.location),
                issue.severity,
                issue.fix_priority,
            ));
        }
    }

    if !file.recommendations.is_empty() {
        out.push_str("\n**Recommendations:**\n\n");
        for rec in &file.recommendations {
            out.push_str(&format!("- {}\n", rec));
        }
    }
    out
}

pub fn format_summary(report: &AnalysisReport) -> String {
    format!(
        "## Summary\n\n| Metric | Value |\n|---|---|\n| Files audited | {} |\n| Critical issues | {} |\n| Major issues | {} |\n| Minor issues | {} |\n| Average freshness | {} |\n| Overall severity | {} |\n\n**Health:** {}\n",
        report.total_files,
        report.critical_issues,
        report.major_issues,
        report.minor_issues,
        format_score(report.average_score),
        report.severity,
        report.overall_health(),
    )
}

/// Markdown audit report for a normalized analysis.
pub fn format_report_markdown(project_name: &str, report: &AnalysisReport) -> String {
    let mut md = format!("# Documentation Freshness Report: {}\n\n", project_name);
    md.push_str(&format_summary(report));

    if report.files.is_empty() {
        md.push_str("\nNo documentation files were audited.\n");
        return md;
    }

    md.push_str("\n## Files\n\n");
    for file in &report.files {
        md.push_str(&format_file_section(file));
        md.push_str("\n---\n\n");
    }
    md
}

/// Append the reviewer's notes; blank feedback leaves the report unchanged.
pub fn append_reviewer_feedback(report_md: &str, feedback: &str) -> String {
    let feedback = feedback.trim();
    if feedback.is_empty() {
        return report_md.to_string();
    }
    format!("{}\n\n## Reviewer feedback\n\n{}\n", report_md.trim_end(), feedback)
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Issue, Severity};

    fn sample() -> AnalysisReport {
        let mut file = FileAnalysis::new("docs/api.md");
        file.severity = Severity::Major;
        file.freshness_score = 55.0;
        file.confidence = 0.7;
        file.doc_type = "readme".to_string();
        file.issues.push(Issue {
            number: 1,
            issue: "Stale | param".to_string(),
            location: "Line 3".to_string(),
            severity: "major".to_string(),
            fix_priority: "Medium".to_string(),
            ..Default::default()
        });
        file.recommendations.push("Fix: Stale param".to_string());
        AnalysisReport {
            total_files: 1,
            critical_issues: 0,
            major_issues: 1,
            minor_issues: 0,
            average_score: 55.0,
            severity: Severity::Major,
            files: vec![file],
        }
    }

    #[test]
    fn test_report_contains_summary_and_files() {
        let md = format_report_markdown("demo", &sample());
        assert!(md.starts_with("# Documentation Freshness Report: demo"));
        assert!(md.contains("| Files audited | 1 |"));
        assert!(md.contains("| Average freshness | 55.0/100 |"));
        assert!(md.contains("### docs/api.md"));
        assert!(md.contains("| 1 | Stale \\| param | Line 3 | major | Medium |"));
        assert!(md.contains("- Fix: Stale param"));
        assert!(md.contains("**Health:** Major"));
    }

    #[test]
    fn test_empty_report() {
        let md = format_report_markdown("demo", &AnalysisReport::empty());
        assert!(md.contains("No documentation files were audited."));
    }

    #[test]
    fn test_reviewer_feedback() {
        assert_eq!(append_reviewer_feedback("# R\n", "   "), "# R\n");
        let out = append_reviewer_feedback("# R\n\n", "Looks good");
        assert_eq!(out, "# R\n\n## Reviewer feedback\n\nLooks good\n");
    }
}
