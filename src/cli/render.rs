use console::style;
use tokio::sync::mpsc;
use crate::models::ReportStatus;
use crate::pipeline::PipelineEvent;
use crate::utils::{format_duration, format_score};

/// Render a pipeline event as a styled terminal line; `None` for events not worth showing.
pub fn render_event(event: &PipelineEvent) -> Option<String> {
    let line = match event {
        PipelineEvent::AuditStarted { report_id, project_name } => format!(
            "{} Auditing {} (report {})",
            style("▶").green().bold(),
            style(project_name).white().bold(),
            style(report_id).cyan(),
        ),
        PipelineEvent::StageStarted { display_name, .. } => format!(
            "{} {}",
            style("⏳").yellow(),
            style(display_name).yellow(),
        ),
        PipelineEvent::StageCompleted { display_name, duration_ms, .. } => format!(
            "  {} {} ({})",
            style("✓").green(),
            style(display_name).green(),
            format_duration(*duration_ms),
        ),
        PipelineEvent::StatusChanged { status: ReportStatus::PendingHumanInput, .. } => format!(
            "  {} Waiting for review",
            style("…").yellow(),
        ),
        PipelineEvent::StatusChanged { .. } => return None,
        PipelineEvent::HumanInputRequested { .. } => return None,
        PipelineEvent::FeedbackDelivered { approved, .. } => format!(
            "  {} {}",
            style("✓").green(),
            if *approved { "Draft approved" } else { "Feedback received" },
        ),
        PipelineEvent::AuditCompleted { total_files, average_score, .. } => format!(
            "{} {} file(s) audited, average freshness {}",
            style("✓").green().bold(),
            total_files,
            style(format_score(*average_score)).bold(),
        ),
        PipelineEvent::PreviewReady { total_files, average_score, .. } => format!(
            "{} {} file(s) analyzed, average freshness {}; awaiting apply",
            style("✓").green().bold(),
            total_files,
            style(format_score(*average_score)).bold(),
        ),
        PipelineEvent::AuditFailed { error, .. } => format!(
            "{} Audit failed: {}",
            style("✗").red().bold(),
            style(error).red(),
        ),
    };
    Some(line)
}

/// Print events to stderr until every sender is dropped.
pub async fn print_events(mut rx: mpsc::UnboundedReceiver<PipelineEvent>) {
    let term = console::Term::stderr();
    while let Some(event) = rx.recv().await {
        if let Some(line) = render_event(&event) {
            let _ = term.write_line(&line);
        }
    }
}
