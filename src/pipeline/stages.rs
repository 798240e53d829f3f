use std::path::PathBuf;
use std::sync::Arc;
use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use crate::analysis;
use crate::errors::DocfreshError;
use crate::models::Severity;
use crate::producers::{collect_files, default_producers, display_path, AuditFinding, FindingProducer, WalkOptions};
use crate::reporting::formatter::{append_reviewer_feedback, format_report_markdown};
use crate::scoring::{score, FreshnessMetrics, ScoringPolicy};
use super::hitl::HumanInputProvider;
use super::stage::Stage;
use super::state::{AuditContext, PipelineConfig, StageName, StageOutput};

/// Evidence the audit stage gathered for one documented file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEvidence {
    pub file_path: String,
    pub doc_type: String,
    pub metrics: FreshnessMetrics,
    pub findings: Vec<AuditFinding>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditEvidence {
    pub files: Vec<FileEvidence>,
}

/// The built-in audit → scoring → suggestion pipeline.
pub fn default_stages(config: &PipelineConfig) -> Vec<Arc<dyn Stage>> {
    vec![
        Arc::new(AuditStage::new(default_producers(), config.walk.clone())),
        Arc::new(ScoringStage::new(config.scoring.clone())),
        Arc::new(SuggestionStage::new(config.human_review)),
    ]
}

pub struct AuditStage {
    producers: Vec<Arc<dyn FindingProducer>>,
    walk: WalkOptions,
}

impl AuditStage {
    pub fn new(producers: Vec<Arc<dyn FindingProducer>>, walk: WalkOptions) -> Self {
        Self { producers, walk }
    }

    async fn inspect(&self, root: &std::path::Path, relative: &std::path::Path) -> Option<FileEvidence> {
        let mut doc_type: Option<String> = None;
        let mut findings = Vec::new();
        let mut metrics = FreshnessMetrics::default();

        let applicable: Vec<&Arc<dyn FindingProducer>> =
            self.producers.iter().filter(|p| p.applies_to(relative)).collect();
        let results = join_all(applicable.iter().map(|p| p.produce(root, relative))).await;

        for (producer, result) in applicable.iter().zip(results) {
            let report = match result {
                Ok(report) => report,
                Err(e) => {
                    warn!(producer = producer.name(), file = %relative.display(), error = %e, "Producer failed, skipping");
                    continue;
                }
            };
            if doc_type.is_none() {
                doc_type = report.doc_type;
            }
            if let Some(c) = report.coverage {
                metrics.total_functions += c.total_functions;
                metrics.functions_with_docstrings += c.functions_with_docstrings;
                metrics.total_params += c.total_params;
                metrics.documented_params += c.documented_params;
            }
            if metrics.last_updated_iso.is_none() {
                metrics.last_updated_iso = report.last_updated_iso;
            }
            findings.extend(report.findings);
        }

        let doc_type = doc_type?;
        for finding in &findings {
            match finding.severity {
                Severity::Critical => metrics.critical_issues += 1,
                Severity::Major => metrics.major_issues += 1,
                Severity::Minor => metrics.minor_issues += 1,
            }
        }
        Some(FileEvidence {
            file_path: display_path(relative),
            doc_type,
            metrics,
            findings,
        })
    }
}

#[async_trait]
impl Stage for AuditStage {
    fn name(&self) -> StageName {
        StageName::Audit
    }

    async fn run(&self, ctx: &AuditContext, _human: &dyn HumanInputProvider) -> Result<StageOutput, DocfreshError> {
        let root: PathBuf = ctx.project_path.clone();
        let walk = self.walk.clone();
        let walk_root = root.clone();
        let candidates = tokio::task::spawn_blocking(move || collect_files(&walk_root, &walk))
            .await
            .map_err(|e| DocfreshError::Internal(format!("Project walk failed: {}", e)))??;
        debug!(report_id = %ctx.report_id, candidates = candidates.len(), "Project walked");

        let mut evidence = AuditEvidence::default();
        for relative in &candidates {
            if let Some(file) = self.inspect(&root, relative).await {
                evidence.files.push(file);
            }
        }
        info!(report_id = %ctx.report_id, files = evidence.files.len(), "Documentation audit complete");

        Ok(StageOutput::new(StageName::Audit, serde_json::to_string_pretty(&evidence)?))
    }
}

pub struct ScoringStage {
    policy: ScoringPolicy,
}

impl ScoringStage {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    fn score_file(&self, file: &FileEvidence, ctx: &AuditContext) -> Value {
        let result = score(&file.metrics, &self.policy, ctx.started_at);
        let issues: Vec<Value> = file
            .findings
            .iter()
            .map(|f| {
                json!({
                    "issue": f.issue,
                    "location": f.location,
                    "impact": f.impact,
                    "expected": f.expected,
                    "actual": f.actual,
                    "fix_priority": f.fix_priority,
                    "severity": f.severity,
                })
            })
            .collect();
        json!({
            "file_path": file.file_path,
            "doc_type": file.doc_type,
            "freshness_score": result.freshness_score,
            "severity": result.severity,
            "confidence": result.confidence,
            "score_breakdown": result.components,
            "issues": issues,
        })
    }
}

#[async_trait]
impl Stage for ScoringStage {
    fn name(&self) -> StageName {
        StageName::Scoring
    }

    async fn run(&self, ctx: &AuditContext, _human: &dyn HumanInputProvider) -> Result<StageOutput, DocfreshError> {
        let raw = ctx
            .latest_output(StageName::Audit)
            .ok_or_else(|| DocfreshError::Stage("Scoring requires audit output".to_string()))?;
        let evidence: AuditEvidence = serde_json::from_str(raw)
            .map_err(|e| DocfreshError::Stage(format!("Unreadable audit output: {}", e)))?;

        let scored: Vec<Value> = evidence.files.iter().map(|f| self.score_file(f, ctx)).collect();
        info!(report_id = %ctx.report_id, files = scored.len(), "Freshness scoring complete");
        Ok(StageOutput::new(StageName::Scoring, serde_json::to_string_pretty(&scored)?))
    }
}

pub struct SuggestionStage {
    human_review: bool,
}

impl SuggestionStage {
    pub fn new(human_review: bool) -> Self {
        Self { human_review }
    }
}

#[async_trait]
impl Stage for SuggestionStage {
    fn name(&self) -> StageName {
        StageName::Suggestion
    }

    async fn run(&self, ctx: &AuditContext, human: &dyn HumanInputProvider) -> Result<StageOutput, DocfreshError> {
        let analysis_raw = ctx.latest_output(StageName::Scoring).unwrap_or("[]").trim();
        let report = analysis::normalize(analysis_raw);
        let draft = format_report_markdown(&ctx.project_name, &report);

        let mut feedback: Vec<String> = ctx
            .feedback
            .iter()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();
        if self.human_review {
            let reply = human.request_input(ctx, &draft).await?;
            if !reply.trim().is_empty() {
                feedback.push(reply.trim().to_string());
            }
        }

        // The scoring output already carries the analysis; this one is only the report.
        let report_md = append_reviewer_feedback(&draft, &feedback.join("\n\n"));
        Ok(StageOutput::new(StageName::Suggestion, report_md))
    }
}
