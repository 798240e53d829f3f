use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::{mpsc, RwLock};
use tracing::{error, info, warn};
use crate::db::Database;
use crate::errors::DocfreshError;
use crate::models::{Project, Report, ReportStatus};
use crate::utils::truncate_error;
use super::events::PipelineEvent;
use super::hitl::{AutoApprove, HumanInputProvider, StatusSink, WaitSlotInputProvider, WaitSlotRegistry};
use super::outputs::collect_outputs;
use super::phase::display_name;
use super::stage::Stage;
use super::stages::default_stages;
use super::state::*;

/// Bookkeeping for one in-flight worker.
pub struct WorkerHandle {
    pub state: RwLock<WorkerState>,
}

impl WorkerHandle {
    fn new() -> Self {
        Self { state: RwLock::new(WorkerState::new()) }
    }
}

/// Clears a report's wait slot and worker entry however the worker exits.
struct WorkerGuard {
    registry: Arc<WaitSlotRegistry>,
    active: Arc<DashMap<String, Arc<WorkerHandle>>>,
    report_id: String,
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        self.registry.remove(&self.report_id);
        self.active.remove(&self.report_id);
    }
}

/// How a worker stores its result once the stages finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Finish {
    Complete,
    /// Park the analysis as `awaiting_user_input` for a later apply.
    Preview,
}

/// Runs audit pipelines off the request path, one worker task per report.
#[derive(Clone)]
pub struct PipelineCoordinator {
    db: Database,
    config: Arc<PipelineConfig>,
    stages: Arc<Vec<Arc<dyn Stage>>>,
    registry: Arc<WaitSlotRegistry>,
    active: Arc<DashMap<String, Arc<WorkerHandle>>>,
    sink: StatusSink,
}

impl PipelineCoordinator {
    pub fn new(db: Database, config: PipelineConfig) -> Self {
        let stages = default_stages(&config);
        Self {
            sink: StatusSink::new(db.clone(), None),
            db,
            config: Arc::new(config),
            stages: Arc::new(stages),
            registry: Arc::new(WaitSlotRegistry::new()),
            active: Arc::new(DashMap::new()),
        }
    }

    /// Replace the built-in stages.
    pub fn with_stages(mut self, stages: Vec<Arc<dyn Stage>>) -> Self {
        self.stages = Arc::new(stages);
        self
    }

    /// Attach an event channel for streaming pipeline events to an observer.
    pub fn with_event_channel(mut self, tx: mpsc::UnboundedSender<PipelineEvent>) -> Self {
        self.sink = StatusSink::new(self.db.clone(), Some(tx));
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn registry(&self) -> &WaitSlotRegistry {
        &self.registry
    }

    pub fn active_workers(&self) -> usize {
        self.active.len()
    }

    /// Create a report for the project and start auditing it in the background.
    pub fn start(&self, project_name: &str, project_path: &str) -> Result<StartResponse, DocfreshError> {
        let (project, report, handle) = self.open_report(project_name, project_path)?;
        let ctx = AuditContext::new(&report.id, &project);
        info!(report_id = %report.id, project = %project.name, "Audit started");

        let human: Arc<dyn HumanInputProvider> = Arc::new(WaitSlotInputProvider::new(
            self.registry.clone(),
            self.sink.clone(),
            self.config.hitl_timeout,
        ));
        self.spawn_worker(ctx, self.stages.to_vec(), human, handle, Finish::Complete);

        Ok(StartResponse {
            report_id: report.id,
            project_id: project.id,
            status: ReportStatus::Processing,
            message: "Audit started".to_string(),
        })
    }

    /// Current state of a report, enriched with worker progress while it runs.
    pub async fn status(&self, report_id: &str) -> Result<Option<StatusResponse>, DocfreshError> {
        let Some(report) = self.db.get_report(report_id)? else {
            return Ok(None);
        };

        let handle = if report.status.is_terminal() {
            None
        } else {
            self.active.get(report_id).map(|h| h.value().clone())
        };
        let (current_stage, elapsed_ms) = match handle {
            Some(handle) => {
                let state = handle.state.read().await;
                (state.current_stage, Some(state.elapsed_ms()))
            }
            None => (None, None),
        };

        let pending = report.status == ReportStatus::PendingHumanInput;
        Ok(Some(StatusResponse {
            report_id: report.id,
            status: report.status,
            agent_output: pending.then_some(report.agent_output),
            message: report.status.describe().to_string(),
            current_stage,
            elapsed_ms,
            error: report.error,
        }))
    }

    /// Deliver reviewer feedback to the worker parked on `report_id`.
    pub fn feedback(&self, report_id: &str, feedback: &str) -> Result<FeedbackAck, DocfreshError> {
        let report = self
            .db
            .get_report(report_id)?
            .ok_or_else(|| DocfreshError::NotFound(format!("Report {} not found", report_id)))?;
        if report.status != ReportStatus::PendingHumanInput {
            return Err(DocfreshError::Conflict(format!(
                "Report {} is not awaiting feedback (status: {})",
                report_id, report.status
            )));
        }

        let feedback = feedback.trim();
        let approved = feedback.is_empty();
        self.registry.deliver(report_id, feedback.to_string())?;
        self.sink.emit(PipelineEvent::FeedbackDelivered {
            report_id: report_id.to_string(),
            approved,
        });
        info!(report_id = %report_id, approved, "Feedback delivered");

        Ok(FeedbackAck {
            report_id: report_id.to_string(),
            status: ReportStatus::Processing,
            message: if approved {
                "Human feedback approved as-is".to_string()
            } else {
                "Feedback submitted".to_string()
            },
        })
    }

    /// Start the analysis stages in the background. The report ends in
    /// `awaiting_user_input` holding the analysis, ready for `apply`.
    pub fn preview(&self, project_name: &str, project_path: &str) -> Result<StartResponse, DocfreshError> {
        let (project, report, handle) = self.open_report(project_name, project_path)?;
        let ctx = AuditContext::new(&report.id, &project);
        info!(report_id = %report.id, project = %project.name, "Preview started");

        self.spawn_worker(ctx, self.preview_stages(), Arc::new(AutoApprove), handle, Finish::Preview);

        Ok(StartResponse {
            report_id: report.id,
            project_id: project.id,
            status: ReportStatus::Processing,
            message: "Preview started".to_string(),
        })
    }

    /// Run the analysis stages on the current task and return the parked report.
    pub async fn run_preview(&self, project_name: &str, project_path: &str) -> Result<Report, DocfreshError> {
        let (project, report, handle) = self.open_report(project_name, project_path)?;
        let ctx = AuditContext::new(&report.id, &project);
        let stages = self.preview_stages();
        self.drive(ctx, &stages, &AutoApprove, &handle, Finish::Preview).await
    }

    /// Generate the final report for a previewed analysis, seeded with `feedback`.
    pub fn apply(&self, report_id: &str, feedback: &str) -> Result<StartResponse, DocfreshError> {
        let report = self
            .db
            .get_report(report_id)?
            .ok_or_else(|| DocfreshError::NotFound(format!("Report {} not found", report_id)))?;
        let no_preview = |status: ReportStatus| {
            DocfreshError::Conflict(format!(
                "Report {} has no preview to apply (status: {})",
                report_id, status
            ))
        };
        if report.status != ReportStatus::AwaitingUserInput {
            return Err(no_preview(report.status));
        }
        let project = self
            .db
            .get_project(&report.project_id)?
            .ok_or_else(|| DocfreshError::NotFound(format!("Project {} not found", report.project_id)))?;

        let mut ctx = AuditContext::new(&report.id, &project);
        if !report.audit_raw.is_empty() {
            ctx.outputs.push(StageOutput::new(StageName::Audit, report.audit_raw.clone()));
        }
        ctx.outputs.push(StageOutput::new(StageName::Scoring, report.analysis_raw.clone()));
        if !feedback.trim().is_empty() {
            ctx.feedback.push(feedback.trim().to_string());
        }

        // Only one caller can move the report out of awaiting_user_input.
        if !self
            .db
            .transition_status(&report.id, ReportStatus::AwaitingUserInput, ReportStatus::Processing)?
        {
            return Err(no_preview(ReportStatus::Processing));
        }
        let handle = match self.register_worker(&report.id) {
            Ok(handle) => handle,
            Err(e) => {
                self.db
                    .transition_status(&report.id, ReportStatus::Processing, ReportStatus::AwaitingUserInput)?;
                return Err(e);
            }
        };
        self.sink.emit(PipelineEvent::StatusChanged {
            report_id: report.id.clone(),
            status: ReportStatus::Processing,
        });
        info!(report_id = %report.id, "Applying suggestions");

        let stages: Vec<Arc<dyn Stage>> = self
            .stages
            .iter()
            .filter(|s| s.name() == StageName::Suggestion)
            .cloned()
            .collect();
        self.spawn_worker(ctx, stages, Arc::new(AutoApprove), handle, Finish::Complete);

        Ok(StartResponse {
            report_id: report.id,
            project_id: project.id,
            status: ReportStatus::Processing,
            message: "Applying suggestions".to_string(),
        })
    }

    /// Run a whole audit on the current task and return the finished report.
    pub async fn run_to_completion(
        &self,
        project_name: &str,
        project_path: &str,
        human: Arc<dyn HumanInputProvider>,
    ) -> Result<Report, DocfreshError> {
        let (project, report, handle) = self.open_report(project_name, project_path)?;
        let ctx = AuditContext::new(&report.id, &project);
        let stages = self.stages.to_vec();
        self.drive(ctx, &stages, human.as_ref(), &handle, Finish::Complete).await
    }

    fn resolve_project(&self, project_name: &str, project_path: &str) -> Result<Project, DocfreshError> {
        let name = project_name.trim();
        let path = project_path.trim();
        if name.is_empty() || path.is_empty() {
            return Err(DocfreshError::InvalidInput(
                "project_name and project_path are required".to_string(),
            ));
        }
        if !Path::new(path).is_dir() {
            return Err(DocfreshError::InvalidInput(format!(
                "Project path does not exist or is not a directory: {}",
                path
            )));
        }
        self.db.create_project(name, path)
    }

    /// Create a processing report with its worker entry and announce it.
    fn open_report(
        &self,
        project_name: &str,
        project_path: &str,
    ) -> Result<(Project, Report, Arc<WorkerHandle>), DocfreshError> {
        let project = self.resolve_project(project_name, project_path)?;
        let report = self.db.create_report(&project.id)?;
        let handle = self.register_worker(&report.id)?;

        self.sink.emit(PipelineEvent::AuditStarted {
            report_id: report.id.clone(),
            project_name: project.name.clone(),
        });
        self.sink.emit(PipelineEvent::StatusChanged {
            report_id: report.id.clone(),
            status: ReportStatus::Processing,
        });
        Ok((project, report, handle))
    }

    fn preview_stages(&self) -> Vec<Arc<dyn Stage>> {
        self.stages
            .iter()
            .filter(|s| s.name() != StageName::Suggestion)
            .cloned()
            .collect()
    }

    /// Claim the worker entry for a report. At most one worker runs per report.
    fn register_worker(&self, report_id: &str) -> Result<Arc<WorkerHandle>, DocfreshError> {
        match self.active.entry(report_id.to_string()) {
            Entry::Occupied(_) => Err(DocfreshError::Conflict(format!(
                "Report {} already has a running worker",
                report_id
            ))),
            Entry::Vacant(slot) => {
                let handle = Arc::new(WorkerHandle::new());
                slot.insert(handle.clone());
                Ok(handle)
            }
        }
    }

    fn spawn_worker(
        &self,
        ctx: AuditContext,
        stages: Vec<Arc<dyn Stage>>,
        human: Arc<dyn HumanInputProvider>,
        handle: Arc<WorkerHandle>,
        finish: Finish,
    ) {
        let report_id = ctx.report_id.clone();
        let this = self.clone();
        let worker = tokio::spawn(async move {
            let _ = this.drive(ctx, &stages, human.as_ref(), &handle, finish).await;
        });

        // A panic skips `drive`'s own failure path; record it here.
        let this = self.clone();
        tokio::spawn(async move {
            if let Err(e) = worker.await {
                error!(report_id = %report_id, error = %e, "Audit worker aborted");
                this.fail(&report_id, &format!("Audit worker aborted: {}", e));
            }
        });
    }

    /// Worker body: run the stages, then persist or fail the report.
    async fn drive(
        &self,
        mut ctx: AuditContext,
        stages: &[Arc<dyn Stage>],
        human: &dyn HumanInputProvider,
        handle: &WorkerHandle,
        finish: Finish,
    ) -> Result<Report, DocfreshError> {
        let ran = {
            let _guard = WorkerGuard {
                registry: self.registry.clone(),
                active: self.active.clone(),
                report_id: ctx.report_id.clone(),
            };
            self.run_stages(&mut ctx, stages, human, handle).await
        };

        // The worker entry is released before the outcome becomes visible, so an
        // apply that sees awaiting_user_input can always claim the report.
        match ran.and_then(|()| self.persist(&ctx, finish)) {
            Ok(report) => {
                self.announce(&report, finish);
                Ok(report)
            }
            Err(e) => {
                error!(report_id = %ctx.report_id, error = %e, "Audit failed");
                self.fail(&ctx.report_id, &e.to_string());
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        ctx: &mut AuditContext,
        stages: &[Arc<dyn Stage>],
        human: &dyn HumanInputProvider,
        handle: &WorkerHandle,
    ) -> Result<(), DocfreshError> {
        for stage in stages {
            let name = stage.name();
            handle.state.write().await.current_stage = Some(name);
            self.sink.emit(PipelineEvent::StageStarted {
                report_id: ctx.report_id.clone(),
                stage: name,
                display_name: display_name(name).to_string(),
            });
            info!(report_id = %ctx.report_id, stage = %name, "Stage started");

            let started = Instant::now();
            let output = stage.run(ctx, human).await?;
            let duration_ms = started.elapsed().as_millis() as u64;

            self.sink.emit(PipelineEvent::StageCompleted {
                report_id: ctx.report_id.clone(),
                stage: name,
                display_name: display_name(name).to_string(),
                duration_ms,
            });
            info!(report_id = %ctx.report_id, stage = %name, duration_ms, "Stage completed");
            ctx.outputs.push(output);
        }
        Ok(())
    }

    fn persist(&self, ctx: &AuditContext, finish: Finish) -> Result<Report, DocfreshError> {
        let collected = collect_outputs(&ctx.outputs);
        if collected.analysis_raw.is_none() {
            warn!(report_id = %ctx.report_id, "No analysis output found; keeping stored aggregates");
        }
        let stored = match finish {
            Finish::Complete => self.db.finalize_report(
                &ctx.report_id,
                &collected.report_md,
                collected.analysis_raw.as_deref(),
                collected.audit_raw.as_deref(),
            )?,
            Finish::Preview => self.db.store_preview(
                &ctx.report_id,
                collected.analysis_raw.as_deref().unwrap_or("[]"),
                collected.audit_raw.as_deref().unwrap_or_default(),
            )?,
        };
        stored.ok_or_else(|| DocfreshError::NotFound(format!("Report {} not found", ctx.report_id)))
    }

    fn announce(&self, report: &Report, finish: Finish) {
        let report_id = report.id.clone();
        match finish {
            Finish::Complete => {
                info!(
                    report_id = %report.id,
                    files = report.total_files,
                    average_score = report.average_score,
                    "Audit completed"
                );
                self.sink.emit(PipelineEvent::StatusChanged {
                    report_id: report_id.clone(),
                    status: ReportStatus::Completed,
                });
                self.sink.emit(PipelineEvent::AuditCompleted {
                    report_id,
                    total_files: report.total_files,
                    average_score: report.average_score,
                });
            }
            Finish::Preview => {
                info!(report_id = %report.id, files = report.total_files, "Preview stored");
                self.sink.emit(PipelineEvent::StatusChanged {
                    report_id: report_id.clone(),
                    status: ReportStatus::AwaitingUserInput,
                });
                self.sink.emit(PipelineEvent::PreviewReady {
                    report_id,
                    total_files: report.total_files,
                    average_score: report.average_score,
                });
            }
        }
    }

    fn fail(&self, report_id: &str, message: &str) {
        let message = truncate_error(message);
        match self.db.set_failed(report_id, &message) {
            Ok(true) => self.sink.emit(PipelineEvent::StatusChanged {
                report_id: report_id.to_string(),
                status: ReportStatus::Failed,
            }),
            Ok(false) => warn!(report_id = %report_id, "Failed report no longer exists"),
            Err(e) => error!(report_id = %report_id, error = %e, "Could not record audit failure"),
        }
        self.sink.emit(PipelineEvent::AuditFailed {
            report_id: report_id.to_string(),
            error: message,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn coordinator() -> PipelineCoordinator {
        PipelineCoordinator::new(Database::in_memory().unwrap(), PipelineConfig::default())
    }

    #[test]
    fn test_start_rejects_bad_input() {
        let c = coordinator();
        assert!(matches!(c.start("", "/tmp"), Err(DocfreshError::InvalidInput(_))));
        assert!(matches!(
            c.start("demo", "/definitely/not/a/dir"),
            Err(DocfreshError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_status_unknown_report() {
        assert!(coordinator().status("nope").await.unwrap().is_none());
    }

    #[test]
    fn test_feedback_errors() {
        let c = coordinator();
        assert!(matches!(c.feedback("nope", ""), Err(DocfreshError::NotFound(_))));

        let dir = TempDir::new().unwrap();
        let project = c.db.create_project("demo", &dir.path().to_string_lossy()).unwrap();
        let report = c.db.create_report(&project.id).unwrap();
        assert!(matches!(c.feedback(&report.id, "x"), Err(DocfreshError::Conflict(_))));

        // Pending in the store but no parked worker
        c.db.set_status(&report.id, ReportStatus::PendingHumanInput, Some("draft")).unwrap();
        assert!(matches!(c.feedback(&report.id, "x"), Err(DocfreshError::NoPendingRequest(_))));
        let after = c.db.get_report(&report.id).unwrap().unwrap();
        assert_eq!(after.status, ReportStatus::PendingHumanInput);
        assert_eq!(after.agent_output, "draft");
    }

    #[test]
    fn test_apply_requires_preview() {
        let c = coordinator();
        let dir = TempDir::new().unwrap();
        let project = c.db.create_project("demo", &dir.path().to_string_lossy()).unwrap();
        let report = c.db.create_report(&project.id).unwrap();
        assert!(matches!(c.apply(&report.id, ""), Err(DocfreshError::Conflict(_))));
        assert!(matches!(c.apply("nope", ""), Err(DocfreshError::NotFound(_))));
    }

    #[test]
    fn test_register_worker_is_exclusive() {
        let c = coordinator();
        let _first = c.register_worker("r1").unwrap();
        assert!(matches!(c.register_worker("r1"), Err(DocfreshError::Conflict(_))));
        assert_eq!(c.active_workers(), 1);
    }

    #[test]
    fn test_apply_backs_off_while_worker_runs() {
        let c = coordinator();
        let dir = TempDir::new().unwrap();
        let project = c.db.create_project("demo", &dir.path().to_string_lossy()).unwrap();
        let pending = c.db.create_pending_report(&project.id, "[]", "").unwrap();

        let _running = c.register_worker(&pending.id).unwrap();
        assert!(matches!(c.apply(&pending.id, ""), Err(DocfreshError::Conflict(_))));
        // The claim is released so a later apply can still run
        let report = c.db.get_report(&pending.id).unwrap().unwrap();
        assert_eq!(report.status, ReportStatus::AwaitingUserInput);
    }
}
