use crate::models::ReportStatus;
use super::state::StageName;

/// Messages sent from audit workers to any attached observer.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// A worker was spawned for a report
    AuditStarted {
        report_id: String,
        project_name: String,
    },
    StageStarted {
        report_id: String,
        stage: StageName,
        display_name: String,
    },
    StageCompleted {
        report_id: String,
        stage: StageName,
        display_name: String,
        duration_ms: u64,
    },
    /// The persisted report status changed
    StatusChanged {
        report_id: String,
        status: ReportStatus,
    },
    /// A stage parked the worker waiting for reviewer feedback
    HumanInputRequested {
        report_id: String,
        draft_preview: String,
    },
    FeedbackDelivered {
        report_id: String,
        approved: bool,
    },
    AuditCompleted {
        report_id: String,
        total_files: u32,
        average_score: f64,
    },
    /// Analysis stored; the report waits for an apply
    PreviewReady {
        report_id: String,
        total_files: u32,
        average_score: f64,
    },
    AuditFailed {
        report_id: String,
        error: String,
    },
}

impl PipelineEvent {
    pub fn report_id(&self) -> &str {
        match self {
            Self::AuditStarted { report_id, .. }
            | Self::StageStarted { report_id, .. }
            | Self::StageCompleted { report_id, .. }
            | Self::StatusChanged { report_id, .. }
            | Self::HumanInputRequested { report_id, .. }
            | Self::FeedbackDelivered { report_id, .. }
            | Self::AuditCompleted { report_id, .. }
            | Self::PreviewReady { report_id, .. }
            | Self::AuditFailed { report_id, .. } => report_id,
        }
    }
}
