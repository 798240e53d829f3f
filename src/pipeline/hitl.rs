//! Human-in-the-loop plumbing: the per-report wait-slot registry and the
//! input providers stages use to ask for reviewer feedback.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use async_trait::async_trait;
use console::style;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};
use crate::db::Database;
use crate::errors::DocfreshError;
use crate::models::ReportStatus;
use crate::utils::preview;
use super::events::PipelineEvent;
use super::state::AuditContext;

/// Source of reviewer feedback for a paused stage.
#[async_trait]
pub trait HumanInputProvider: Send + Sync {
    /// Present `draft` for review and return the feedback; empty means approve as-is.
    async fn request_input(&self, ctx: &AuditContext, draft: &str) -> Result<String, DocfreshError>;
}

/// The draft itself lives on the report's `agent_output`.
struct WaitSlot {
    /// Taken by the first delivery
    sender: Option<oneshot::Sender<String>>,
}

/// Wait slots keyed by report id. One lock covers register, deliver and remove.
#[derive(Default)]
pub struct WaitSlotRegistry {
    slots: Mutex<HashMap<String, WaitSlot>>,
}

impl WaitSlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, WaitSlot>> {
        // No critical section can leave the map half-updated.
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Open a slot for `report_id`. At most one slot per report exists at a time.
    pub fn register(&self, report_id: &str) -> Result<oneshot::Receiver<String>, DocfreshError> {
        let mut slots = self.slots();
        if slots.contains_key(report_id) {
            return Err(DocfreshError::DuplicateWaitSlot(report_id.to_string()));
        }
        let (tx, rx) = oneshot::channel();
        slots.insert(report_id.to_string(), WaitSlot { sender: Some(tx) });
        Ok(rx)
    }

    /// Hand feedback to the waiting worker. Succeeds at most once per slot.
    pub fn deliver(&self, report_id: &str, feedback: String) -> Result<(), DocfreshError> {
        let mut slots = self.slots();
        let sender = slots
            .get_mut(report_id)
            .and_then(|slot| slot.sender.take())
            .ok_or_else(|| DocfreshError::NoPendingRequest(report_id.to_string()))?;
        sender
            .send(feedback)
            .map_err(|_| DocfreshError::NoPendingRequest(report_id.to_string()))
    }

    pub fn remove(&self, report_id: &str) -> bool {
        self.slots().remove(report_id).is_some()
    }

    /// Whether a slot exists that has not been signaled yet.
    pub fn is_waiting(&self, report_id: &str) -> bool {
        self.slots().get(report_id).is_some_and(|slot| slot.sender.is_some())
    }

    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Persists status transitions and mirrors them onto the event channel.
#[derive(Clone)]
pub struct StatusSink {
    db: Database,
    event_tx: Option<mpsc::UnboundedSender<PipelineEvent>>,
}

impl StatusSink {
    pub fn new(db: Database, event_tx: Option<mpsc::UnboundedSender<PipelineEvent>>) -> Self {
        Self { db, event_tx }
    }

    pub fn set(
        &self,
        report_id: &str,
        status: ReportStatus,
        agent_output: Option<&str>,
    ) -> Result<bool, DocfreshError> {
        let updated = self.db.set_status(report_id, status, agent_output)?;
        if updated {
            self.emit(PipelineEvent::StatusChanged { report_id: report_id.to_string(), status });
        } else {
            warn!(report_id = %report_id, status = %status, "Status update matched no report");
        }
        Ok(updated)
    }

    pub fn emit(&self, event: PipelineEvent) {
        if let Some(ref tx) = self.event_tx {
            let _ = tx.send(event);
        }
    }
}

/// Removes the slot when the waiting future ends, including on cancellation.
struct SlotGuard<'a> {
    registry: &'a WaitSlotRegistry,
    report_id: &'a str,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.registry.remove(self.report_id);
    }
}

/// Parks the stage on a wait slot until feedback arrives through the API.
pub struct WaitSlotInputProvider {
    registry: Arc<WaitSlotRegistry>,
    sink: StatusSink,
    timeout: Option<Duration>,
}

impl WaitSlotInputProvider {
    pub fn new(registry: Arc<WaitSlotRegistry>, sink: StatusSink, timeout: Option<Duration>) -> Self {
        Self { registry, sink, timeout }
    }
}

#[async_trait]
impl HumanInputProvider for WaitSlotInputProvider {
    async fn request_input(&self, ctx: &AuditContext, draft: &str) -> Result<String, DocfreshError> {
        let report_id = ctx.report_id.as_str();
        let rx = self.registry.register(report_id)?;
        let guard = SlotGuard { registry: &self.registry, report_id };

        self.sink.set(report_id, ReportStatus::PendingHumanInput, Some(draft))?;
        self.sink.emit(PipelineEvent::HumanInputRequested {
            report_id: report_id.to_string(),
            draft_preview: preview(draft),
        });
        info!(report_id = %report_id, "Awaiting human feedback");

        let received = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(received) => received,
                Err(_) => {
                    return Err(DocfreshError::Timeout(format!(
                        "No feedback for report {} within {}s",
                        report_id,
                        limit.as_secs()
                    )));
                }
            },
            None => rx.await,
        };
        drop(guard);

        let feedback = received
            .map_err(|_| DocfreshError::Internal(format!("Wait slot for report {} closed without feedback", report_id)))?;
        self.sink.set(report_id, ReportStatus::Processing, None)?;
        info!(report_id = %report_id, approved = feedback.trim().is_empty(), "Human feedback received");
        Ok(feedback)
    }
}

/// Prints the draft and reads one line of feedback from the terminal.
pub struct TerminalInputProvider;

#[async_trait]
impl HumanInputProvider for TerminalInputProvider {
    async fn request_input(&self, ctx: &AuditContext, draft: &str) -> Result<String, DocfreshError> {
        let header = format!(
            "\n{} Review the draft report for {}\n",
            style("?").yellow().bold(),
            style(&ctx.project_name).cyan(),
        );
        let draft = draft.to_string();
        tokio::task::spawn_blocking(move || {
            let term = console::Term::stdout();
            term.write_line(&header)?;
            term.write_line(&draft)?;
            term.write_line(&format!(
                "{} Enter feedback (empty line approves as-is):",
                style(">").green().bold()
            ))?;
            term.read_line()
        })
        .await
        .map_err(|e| DocfreshError::Internal(format!("Terminal input task failed: {}", e)))?
        .map_err(DocfreshError::from)
    }
}

/// Approves every draft without feedback.
pub struct AutoApprove;

#[async_trait]
impl HumanInputProvider for AutoApprove {
    async fn request_input(&self, _ctx: &AuditContext, _draft: &str) -> Result<String, DocfreshError> {
        Ok(String::new())
    }
}

/// Answers every request with the same feedback text.
pub struct PresetInput(pub String);

#[async_trait]
impl HumanInputProvider for PresetInput {
    async fn request_input(&self, _ctx: &AuditContext, _draft: &str) -> Result<String, DocfreshError> {
        Ok(self.0.clone())
    }
}
