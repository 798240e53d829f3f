use std::path::PathBuf;
use std::time::Duration;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::models::{Project, ReportStatus};
use crate::producers::WalkOptions;
use crate::scoring::ScoringPolicy;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum StageName {
    Audit,
    Scoring,
    Suggestion,
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Audit => write!(f, "audit"),
            Self::Scoring => write!(f, "scoring"),
            Self::Suggestion => write!(f, "suggestion"),
        }
    }
}

/// Opaque text produced by one stage run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageOutput {
    pub stage: StageName,
    pub raw: String,
}

impl StageOutput {
    pub fn new(stage: StageName, raw: impl Into<String>) -> Self {
        Self { stage, raw: raw.into() }
    }
}

/// Everything a stage knows about the run it belongs to.
#[derive(Debug, Clone)]
pub struct AuditContext {
    pub report_id: String,
    pub project_id: String,
    pub project_name: String,
    pub project_path: PathBuf,
    pub started_at: DateTime<Utc>,
    /// Outputs of the stages that already ran, in execution order
    pub outputs: Vec<StageOutput>,
    /// Reviewer feedback supplied before the run started
    pub feedback: Vec<String>,
}

impl AuditContext {
    pub fn new(report_id: &str, project: &Project) -> Self {
        Self {
            report_id: report_id.to_string(),
            project_id: project.id.clone(),
            project_name: project.name.clone(),
            project_path: PathBuf::from(&project.path),
            started_at: Utc::now(),
            outputs: Vec::new(),
            feedback: Vec::new(),
        }
    }

    /// Raw output of the most recent run of `stage`.
    pub fn latest_output(&self, stage: StageName) -> Option<&str> {
        self.outputs
            .iter()
            .rev()
            .find(|o| o.stage == stage)
            .map(|o| o.raw.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Pause the suggestion stage for reviewer feedback
    pub human_review: bool,
    /// Upper bound on a single wait for feedback; `None` waits indefinitely
    pub hitl_timeout: Option<Duration>,
    pub walk: WalkOptions,
    pub scoring: ScoringPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            human_review: true,
            hitl_timeout: None,
            walk: WalkOptions::default(),
            scoring: ScoringPolicy::default(),
        }
    }
}

/// Progress of a running worker, used only to enrich status responses.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerState {
    pub current_stage: Option<StageName>,
    pub started_at: DateTime<Utc>,
}

impl WorkerState {
    pub fn new() -> Self {
        Self { current_stage: None, started_at: Utc::now() }
    }

    pub fn elapsed_ms(&self) -> u64 {
        (Utc::now() - self.started_at).num_milliseconds().max(0) as u64
    }
}

impl Default for WorkerState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StartResponse {
    pub report_id: String,
    pub project_id: String,
    pub status: ReportStatus,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusResponse {
    pub report_id: String,
    pub status: ReportStatus,
    /// Draft under review; present only while the report is pending human input
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_output: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_stage: Option<StageName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackAck {
    pub report_id: String,
    pub status: ReportStatus,
    pub message: String,
}
