use serde::{Deserialize, Serialize};
use super::analysis::{FileAnalysis, Severity};
use crate::errors::DocfreshError;

/// Lifecycle of an audit report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Processing,
    PendingHumanInput,
    AwaitingUserInput,
    Completed,
    Failed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::PendingHumanInput => "pending_human_input",
            Self::AwaitingUserInput => "awaiting_user_input",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Message shown to clients polling the report.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Processing => "Audit is running",
            Self::PendingHumanInput => "Awaiting human review of the draft report",
            Self::AwaitingUserInput => "Analysis preview is ready; apply it to generate the report",
            Self::Completed => "Audit completed",
            Self::Failed => "Audit failed",
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ReportStatus {
    type Err = DocfreshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Self::Processing),
            "pending_human_input" => Ok(Self::PendingHumanInput),
            "awaiting_user_input" => Ok(Self::AwaitingUserInput),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(DocfreshError::Database(format!("Unknown report status '{}'", other))),
        }
    }
}

/// One audit run's persisted outcome.
///
/// The numeric aggregates and `severity` are derived from `analysis_raw` and are
/// rewritten whenever it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub project_id: String,
    pub status: ReportStatus,
    pub total_files: u32,
    pub critical_issues: u32,
    pub major_issues: u32,
    pub minor_issues: u32,
    pub average_score: f64,
    pub severity: Severity,
    pub report_md: String,
    pub analysis_raw: String,
    pub audit_raw: String,
    /// Draft awaiting human review; only meaningful while pending.
    pub agent_output: String,
    pub error: Option<String>,
    pub created_at: String,
}

/// Row of the audit history listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditHistoryEntry {
    pub id: String,
    pub project_id: String,
    pub project_name: String,
    pub audit_date: String,
    pub status: ReportStatus,
    pub total_files: u32,
    pub critical_issues: u32,
    pub major_issues: u32,
    pub minor_issues: u32,
    pub average_score: f64,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_files: u32,
    pub critical_issues: u32,
    pub major_issues: u32,
    pub minor_issues: u32,
    pub average_freshness_score: f64,
    pub overall_health: String,
}

/// Dashboard view of a report with its parsed per-file analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullReport {
    pub id: String,
    pub project: String,
    pub project_id: String,
    pub audit_date: String,
    pub status: ReportStatus,
    pub report_md: String,
    pub error: Option<String>,
    pub summary: ReportSummary,
    pub files: Vec<FileAnalysis>,
}
