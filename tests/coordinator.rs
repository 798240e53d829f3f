use std::fs;
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::mpsc;
use docfresh::db::Database;
use docfresh::errors::DocfreshError;
use docfresh::models::ReportStatus;
use docfresh::pipeline::{
    AuditContext, AutoApprove, HumanInputProvider, PipelineConfig, PipelineCoordinator, PipelineEvent,
    PresetInput, Stage, StageName, StageOutput,
};

const ANALYSIS: &str = r#"[
  {"file_path": "README.md", "freshness_score": 40, "severity": "major", "issues": ["Install steps are stale"]},
  {"file_path": "docs/api.md", "freshness_score": 90, "severity": "minor", "issues": []}
]"#;

struct ScriptedScoring;

#[async_trait]
impl Stage for ScriptedScoring {
    fn name(&self) -> StageName {
        StageName::Scoring
    }

    async fn run(&self, _ctx: &AuditContext, _human: &dyn HumanInputProvider) -> Result<StageOutput, DocfreshError> {
        Ok(StageOutput::new(StageName::Scoring, ANALYSIS))
    }
}

/// Asks for review and echoes seeded and received feedback into the report.
struct AskingSuggestion;

#[async_trait]
impl Stage for AskingSuggestion {
    fn name(&self) -> StageName {
        StageName::Suggestion
    }

    async fn run(&self, ctx: &AuditContext, human: &dyn HumanInputProvider) -> Result<StageOutput, DocfreshError> {
        let reply = human.request_input(ctx, "# Draft").await?;
        let raw = format!("# Final\n\nseeded: {}\nreply: {}\n", ctx.feedback.join(" | "), reply);
        Ok(StageOutput::new(StageName::Suggestion, raw))
    }
}

struct FailingScoring;

#[async_trait]
impl Stage for FailingScoring {
    fn name(&self) -> StageName {
        StageName::Scoring
    }

    async fn run(&self, _ctx: &AuditContext, _human: &dyn HumanInputProvider) -> Result<StageOutput, DocfreshError> {
        Err(DocfreshError::Stage("scoring broke".to_string()))
    }
}

struct FailingStage;

#[async_trait]
impl Stage for FailingStage {
    fn name(&self) -> StageName {
        StageName::Suggestion
    }

    async fn run(&self, _ctx: &AuditContext, _human: &dyn HumanInputProvider) -> Result<StageOutput, DocfreshError> {
        Err(DocfreshError::Stage("boom".to_string()))
    }
}

fn scripted(stages: Vec<Arc<dyn Stage>>) -> (Database, PipelineCoordinator, mpsc::UnboundedReceiver<PipelineEvent>) {
    scripted_with(PipelineConfig::default(), stages)
}

fn scripted_with(
    config: PipelineConfig,
    stages: Vec<Arc<dyn Stage>>,
) -> (Database, PipelineCoordinator, mpsc::UnboundedReceiver<PipelineEvent>) {
    let db = Database::in_memory().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    let coordinator = PipelineCoordinator::new(db.clone(), config)
        .with_stages(stages)
        .with_event_channel(tx);
    (db, coordinator, rx)
}

/// Collect events up to and including the first one matching `done`.
async fn events_until(
    rx: &mut mpsc::UnboundedReceiver<PipelineEvent>,
    mut done: impl FnMut(&PipelineEvent) -> bool,
) -> Vec<PipelineEvent> {
    let mut seen = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("pipeline event in time")
            .expect("event channel open");
        let finished = done(&event);
        seen.push(event);
        if finished {
            return seen;
        }
    }
}

fn statuses(events: &[PipelineEvent]) -> Vec<ReportStatus> {
    events
        .iter()
        .filter_map(|e| match e {
            PipelineEvent::StatusChanged { status, .. } => Some(*status),
            _ => None,
        })
        .collect()
}

async fn wait_for_slot(coordinator: &PipelineCoordinator, report_id: &str) {
    for _ in 0..1000 {
        if coordinator.registry().is_waiting(report_id) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("worker never parked on report {}", report_id);
}

#[tokio::test]
async fn test_review_round_trip_status_sequence() {
    let (db, coordinator, mut rx) = scripted(vec![Arc::new(ScriptedScoring), Arc::new(AskingSuggestion)]);
    let dir = TempDir::new().unwrap();

    let started = coordinator.start("demo", &dir.path().to_string_lossy()).unwrap();
    assert_eq!(started.status, ReportStatus::Processing);
    wait_for_slot(&coordinator, &started.report_id).await;

    let status = coordinator.status(&started.report_id).await.unwrap().unwrap();
    assert_eq!(status.status, ReportStatus::PendingHumanInput);
    assert_eq!(status.agent_output.as_deref(), Some("# Draft"));
    assert_eq!(status.current_stage, Some(StageName::Suggestion));

    let ack = coordinator.feedback(&started.report_id, "approve").unwrap();
    assert_eq!(ack.message, "Feedback submitted");

    // The slot signals once; the worker has not resumed yet
    assert!(matches!(
        coordinator.feedback(&started.report_id, "again"),
        Err(DocfreshError::NoPendingRequest(_))
    ));

    let events = events_until(&mut rx, |e| matches!(e, PipelineEvent::AuditCompleted { .. })).await;
    assert_eq!(
        statuses(&events),
        vec![
            ReportStatus::Processing,
            ReportStatus::PendingHumanInput,
            ReportStatus::Processing,
            ReportStatus::Completed,
        ]
    );
    assert!(events.iter().all(|e| e.report_id() == started.report_id));

    let report = db.get_report(&started.report_id).unwrap().unwrap();
    assert_eq!(report.status, ReportStatus::Completed);
    assert!(report.report_md.contains("reply: approve"));
    assert_eq!(report.total_files, 2);
    assert_eq!(report.major_issues, 1);
    assert!(coordinator.registry().is_empty());
}

#[tokio::test]
async fn test_empty_feedback_approves_as_is() {
    let (_db, coordinator, mut rx) = scripted(vec![Arc::new(AskingSuggestion)]);
    let dir = TempDir::new().unwrap();

    let started = coordinator.start("demo", &dir.path().to_string_lossy()).unwrap();
    wait_for_slot(&coordinator, &started.report_id).await;
    let ack = coordinator.feedback(&started.report_id, "   ").unwrap();
    assert_eq!(ack.message, "Human feedback approved as-is");

    let events = events_until(&mut rx, |e| matches!(e, PipelineEvent::AuditCompleted { .. })).await;
    assert!(events.contains(&PipelineEvent::FeedbackDelivered {
        report_id: started.report_id.clone(),
        approved: true,
    }));
}

#[tokio::test]
async fn test_failing_stage_marks_report_failed() {
    let (db, coordinator, mut rx) = scripted(vec![Arc::new(ScriptedScoring), Arc::new(FailingStage)]);
    let dir = TempDir::new().unwrap();

    let started = coordinator.start("demo", &dir.path().to_string_lossy()).unwrap();
    let events = events_until(&mut rx, |e| matches!(e, PipelineEvent::AuditFailed { .. })).await;
    assert_eq!(statuses(&events).last(), Some(&ReportStatus::Failed));

    wait_idle(&coordinator).await;
    let report = db.get_report(&started.report_id).unwrap().unwrap();
    assert_eq!(report.status, ReportStatus::Failed);
    assert!(report.error.unwrap().contains("boom"));
    assert!(coordinator.registry().is_empty());

    let status = coordinator.status(&started.report_id).await.unwrap().unwrap();
    assert!(status.current_stage.is_none());
}

async fn wait_idle(coordinator: &PipelineCoordinator) {
    while coordinator.active_workers() > 0 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_hitl_timeout_fails_started_audit() {
    let config = PipelineConfig {
        hitl_timeout: Some(Duration::from_millis(50)),
        ..PipelineConfig::default()
    };
    let (db, coordinator, mut rx) = scripted_with(config, vec![Arc::new(ScriptedScoring), Arc::new(AskingSuggestion)]);
    let dir = TempDir::new().unwrap();

    let started = coordinator.start("demo", &dir.path().to_string_lossy()).unwrap();
    let events = events_until(&mut rx, |e| matches!(e, PipelineEvent::AuditFailed { .. })).await;
    assert_eq!(
        statuses(&events),
        vec![ReportStatus::Processing, ReportStatus::PendingHumanInput, ReportStatus::Failed]
    );
    wait_idle(&coordinator).await;

    let report = db.get_report(&started.report_id).unwrap().unwrap();
    assert_eq!(report.status, ReportStatus::Failed);
    assert!(report.error.unwrap().contains("No feedback"));
    assert!(coordinator.registry().is_empty());
    assert_eq!(coordinator.active_workers(), 0);
    assert!(matches!(
        coordinator.feedback(&started.report_id, "too late"),
        Err(DocfreshError::Conflict(_))
    ));
}

#[tokio::test]
async fn test_preview_then_apply_seeds_feedback() {
    let (db, coordinator, mut rx) = scripted(vec![Arc::new(ScriptedScoring), Arc::new(AskingSuggestion)]);
    let dir = TempDir::new().unwrap();

    let started = coordinator.preview("demo", &dir.path().to_string_lossy()).unwrap();
    assert_eq!(started.status, ReportStatus::Processing);
    assert_eq!(started.message, "Preview started");

    let events = events_until(&mut rx, |e| matches!(e, PipelineEvent::PreviewReady { .. })).await;
    assert_eq!(
        statuses(&events),
        vec![ReportStatus::Processing, ReportStatus::AwaitingUserInput]
    );
    assert!(events.iter().all(|e| !matches!(
        e,
        PipelineEvent::StageStarted { stage: StageName::Suggestion, .. }
    )));
    assert_eq!(coordinator.active_workers(), 0);

    let preview = db.get_report(&started.report_id).unwrap().unwrap();
    assert_eq!(preview.status, ReportStatus::AwaitingUserInput);
    assert_eq!(preview.total_files, 2);
    assert_eq!(preview.major_issues, 1);
    assert_eq!(preview.analysis_raw, ANALYSIS);

    let applied = coordinator.apply(&preview.id, "Lead with install steps").unwrap();
    assert_eq!(applied.report_id, preview.id);
    events_until(&mut rx, |e| matches!(e, PipelineEvent::AuditCompleted { .. })).await;

    let report = db.get_report(&preview.id).unwrap().unwrap();
    assert_eq!(report.status, ReportStatus::Completed);
    assert!(report.report_md.contains("seeded: Lead with install steps"));
    assert!(report.report_md.contains("reply: \n"));
    assert_eq!(report.total_files, 2);

    assert!(matches!(coordinator.apply(&preview.id, ""), Err(DocfreshError::Conflict(_))));
}

#[tokio::test]
async fn test_preview_failure_marks_report_failed() {
    let (db, coordinator, mut rx) = scripted(vec![Arc::new(FailingScoring), Arc::new(AskingSuggestion)]);
    let dir = TempDir::new().unwrap();

    let started = coordinator.preview("demo", &dir.path().to_string_lossy()).unwrap();
    events_until(&mut rx, |e| matches!(e, PipelineEvent::AuditFailed { .. })).await;
    wait_idle(&coordinator).await;

    let report = db.get_report(&started.report_id).unwrap().unwrap();
    assert_eq!(report.status, ReportStatus::Failed);
    assert!(report.error.unwrap().contains("scoring broke"));
    assert!(matches!(coordinator.apply(&started.report_id, ""), Err(DocfreshError::Conflict(_))));
}

#[tokio::test]
async fn test_run_preview_returns_parked_report() {
    let (_db, coordinator, _rx) = scripted(vec![Arc::new(ScriptedScoring), Arc::new(AskingSuggestion)]);
    let dir = TempDir::new().unwrap();

    let report = coordinator.run_preview("demo", &dir.path().to_string_lossy()).await.unwrap();
    assert_eq!(report.status, ReportStatus::AwaitingUserInput);
    assert_eq!(report.total_files, 2);
    assert!(report.report_md.is_empty());
    assert_eq!(coordinator.active_workers(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_applies_start_one_worker() {
    const CALLERS: usize = 8;
    const REPORTS: usize = 10;

    let (db, coordinator, mut rx) = scripted(vec![Arc::new(ScriptedScoring), Arc::new(AskingSuggestion)]);
    let dir = TempDir::new().unwrap();
    let project = db.create_project("demo", &dir.path().to_string_lossy()).unwrap();

    let mut ids = Vec::new();
    for _ in 0..REPORTS {
        let pending = db.create_pending_report(&project.id, ANALYSIS, "").unwrap();
        ids.push(pending.id.clone());
        let barrier = Arc::new(tokio::sync::Barrier::new(CALLERS));
        let callers: Vec<_> = (0..CALLERS)
            .map(|i| {
                let coordinator = coordinator.clone();
                let barrier = barrier.clone();
                let id = pending.id.clone();
                tokio::spawn(async move {
                    barrier.wait().await;
                    coordinator.apply(&id, &format!("caller {}", i))
                })
            })
            .collect();

        let mut accepted = 0;
        for caller in callers {
            match caller.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(DocfreshError::Conflict(_)) => {}
                Err(other) => panic!("unexpected apply error: {}", other),
            }
        }
        assert_eq!(accepted, 1, "report {} accepted {} applies", pending.id, accepted);
    }

    let events = {
        let mut completed = 0;
        events_until(&mut rx, |e| {
            if matches!(e, PipelineEvent::AuditCompleted { .. }) {
                completed += 1;
            }
            completed == REPORTS
        })
        .await
    };
    let started = events
        .iter()
        .filter(|e| matches!(e, PipelineEvent::StageStarted { .. }))
        .count();
    assert_eq!(started, REPORTS);

    wait_idle(&coordinator).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    while let Ok(late) = rx.try_recv() {
        assert!(
            !matches!(late, PipelineEvent::AuditCompleted { .. } | PipelineEvent::StageStarted { .. }),
            "extra worker event: {:?}",
            late
        );
    }
    for id in &ids {
        let report = db.get_report(id).unwrap().unwrap();
        assert_eq!(report.status, ReportStatus::Completed);
        assert_eq!(report.report_md.matches("seeded: caller").count(), 1);
    }
}

#[tokio::test]
async fn test_run_to_completion_with_scripted_stages() {
    let (_db, coordinator, _rx) = scripted(vec![Arc::new(ScriptedScoring), Arc::new(AskingSuggestion)]);
    let dir = TempDir::new().unwrap();

    let report = coordinator
        .run_to_completion("demo", &dir.path().to_string_lossy(), Arc::new(AutoApprove))
        .await
        .unwrap();
    assert_eq!(report.status, ReportStatus::Completed);
    assert_eq!(report.total_files, 2);
    assert_eq!(coordinator.active_workers(), 0);
}

#[tokio::test]
async fn test_run_to_completion_with_builtin_stages() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("tool.py"),
        "def run(path, force):\n    \"\"\"Run the tool.\n\n    Args:\n        path: target\n    \"\"\"\n",
    )
    .unwrap();
    fs::write(dir.path().join("README.md"), "Use `tool.py`.\n").unwrap();

    let db = Database::in_memory().unwrap();
    let coordinator = PipelineCoordinator::new(db, PipelineConfig::default());
    let report = coordinator
        .run_to_completion(
            "tool",
            &dir.path().to_string_lossy(),
            Arc::new(PresetInput("Mention the force flag".to_string())),
        )
        .await
        .unwrap();

    assert_eq!(report.status, ReportStatus::Completed);
    assert_eq!(report.total_files, 2);
    // `force` is undocumented; the README reference resolves
    assert_eq!(report.critical_issues + report.major_issues + report.minor_issues, 1);
    assert!(report.report_md.starts_with("# Documentation Freshness Report: tool"));
    assert!(report.report_md.contains("## Reviewer feedback\n\nMention the force flag"));
    assert!(report.audit_raw.contains("tool.py"));
}
