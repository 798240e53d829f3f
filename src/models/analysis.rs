use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

/// Severity of a documentation issue or file, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Minor,
    Major,
    Critical,
}

impl Severity {
    /// Numeric rank where higher values indicate higher severity.
    /// Minor = 1, Major = 2, Critical = 3.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Minor => 1,
            Severity::Major => 2,
            Severity::Critical => 3,
        }
    }

    /// Case-insensitive parse that maps anything unrecognized to `Minor`.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "critical" => Severity::Critical,
            "major" => Severity::Major,
            _ => Severity::Minor,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Minor => "minor",
            Severity::Major => "major",
            Severity::Critical => "critical",
        }
    }

    /// Pick the dominant bucket from per-severity counts.
    /// Ties go to the more severe bucket; all-zero counts yield `Minor`.
    pub fn dominant(critical: u32, major: u32, minor: u32) -> Self {
        if critical > 0 && critical >= major && critical >= minor {
            Severity::Critical
        } else if major > 0 && major >= minor {
            Severity::Major
        } else {
            Severity::Minor
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single documentation discrepancy within a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Issue {
    /// 1-based position within the owning file's issue list
    pub number: u32,
    pub issue: String,
    pub location: String,
    pub impact: String,
    /// What the documentation claims
    pub expected: String,
    /// What the code actually does
    pub actual: String,
    pub fix_priority: String,
    pub severity: String,
}

/// Canonical per-file result of an audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAnalysis {
    pub file: String,
    pub doc_type: String,
    pub severity: Severity,
    pub freshness_score: f64,
    pub confidence: f64,
    pub score_breakdown: BTreeMap<String, f64>,
    pub issues: Vec<Issue>,
    pub recommendations: Vec<String>,
}

impl FileAnalysis {
    pub fn new(file: &str) -> Self {
        Self {
            file: file.to_string(),
            doc_type: String::new(),
            severity: Severity::Minor,
            freshness_score: 0.0,
            confidence: 0.0,
            score_breakdown: BTreeMap::new(),
            issues: Vec::new(),
            recommendations: Vec::new(),
        }
    }
}

/// Normalized view of one pipeline run's analysis output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub total_files: u32,
    pub critical_issues: u32,
    pub major_issues: u32,
    pub minor_issues: u32,
    pub average_score: f64,
    pub severity: Severity,
    pub files: Vec<FileAnalysis>,
}

impl AnalysisReport {
    pub fn empty() -> Self {
        Self {
            total_files: 0,
            critical_issues: 0,
            major_issues: 0,
            minor_issues: 0,
            average_score: 0.0,
            severity: Severity::Minor,
            files: Vec::new(),
        }
    }

    pub fn overall_health(&self) -> &'static str {
        overall_health(self.total_files, self.critical_issues, self.major_issues, self.minor_issues)
    }
}

/// Human readable health line for dashboards.
pub fn overall_health(total_files: u32, critical: u32, major: u32, minor: u32) -> &'static str {
    if total_files == 0 {
        return "No structured issue data available";
    }
    match Severity::dominant(critical, major, minor) {
        Severity::Critical => "Critical – immediate remediation required",
        Severity::Major => "Major – should be addressed soon",
        Severity::Minor => "Minor – low priority improvements",
    }
}

impl Default for AnalysisReport {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_rank_ordering() {
        assert!(Severity::Critical.rank() > Severity::Major.rank());
        assert!(Severity::Major.rank() > Severity::Minor.rank());
    }

    #[test]
    fn test_severity_parse_lenient() {
        assert_eq!(Severity::parse_lenient("CRITICAL"), Severity::Critical);
        assert_eq!(Severity::parse_lenient(" Major "), Severity::Major);
        assert_eq!(Severity::parse_lenient("blocker"), Severity::Minor);
        assert_eq!(Severity::parse_lenient(""), Severity::Minor);
    }

    #[test]
    fn test_dominant_tie_breaking() {
        assert_eq!(Severity::dominant(2, 2, 2), Severity::Critical);
        assert_eq!(Severity::dominant(0, 3, 3), Severity::Major);
        assert_eq!(Severity::dominant(1, 0, 5), Severity::Minor);
        assert_eq!(Severity::dominant(0, 0, 0), Severity::Minor);
    }

    #[test]
    fn test_overall_health_empty() {
        assert_eq!(AnalysisReport::empty().overall_health(), "No structured issue data available");
    }

    #[test]
    fn test_severity_serde_lowercase() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
    }
}
