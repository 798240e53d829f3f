use std::path::Path;
use std::sync::Arc;
use console::style;
use tokio::sync::mpsc;
use tracing::info;
use crate::cli::commands::AuditArgs;
use crate::errors::DocfreshError;
use crate::pipeline::{AutoApprove, HumanInputProvider, PipelineCoordinator, PresetInput, TerminalInputProvider};

pub async fn handle_audit(args: AuditArgs, quiet: bool) -> Result<(), DocfreshError> {
    let config = super::resolve_config(args.config.as_deref()).await?;
    let mut pipeline = config.pipeline_config()?;
    if args.no_review {
        pipeline.human_review = false;
    }
    let db = super::open_database(args.db.as_deref(), &config)?;

    // Canonical paths keep repeated audits of one directory on one project.
    let path = std::fs::canonicalize(&args.path)
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| args.path.clone());
    let name = args.name.clone().unwrap_or_else(|| project_name_from(&path));
    info!(project = %name, path = %path, "Running audit");

    let (tx, rx) = mpsc::unbounded_channel();
    let coordinator = PipelineCoordinator::new(db.clone(), pipeline).with_event_channel(tx);
    let printer = (!quiet).then(|| tokio::spawn(super::render::print_events(rx)));

    let outcome = if args.preview {
        coordinator.run_preview(&name, &path).await
    } else {
        let human: Arc<dyn HumanInputProvider> = if args.auto_approve {
            Arc::new(AutoApprove)
        } else if let Some(feedback) = args.feedback.clone() {
            Arc::new(PresetInput(feedback))
        } else {
            Arc::new(TerminalInputProvider)
        };
        coordinator.run_to_completion(&name, &path, human).await
    };

    // Dropping the coordinator closes the event channel so the printer drains and exits.
    drop(coordinator);
    if let Some(printer) = printer {
        let _ = printer.await;
    }
    let report = outcome?;

    if args.json {
        let full = db
            .get_full_report(&report.id)?
            .ok_or_else(|| DocfreshError::NotFound(format!("Report {} not found", report.id)))?;
        println!("{}", serde_json::to_string_pretty(&full)?);
    } else if args.preview {
        println!(
            "{} Preview stored as report {} ({} file(s), average freshness {:.1}).",
            style("✓").green(),
            style(&report.id).cyan(),
            report.total_files,
            report.average_score,
        );
        println!("Apply it with: POST /analyze/{}/apply", report.id);
    } else {
        println!("{}", report.report_md);
    }
    Ok(())
}

fn project_name_from(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "project".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_name_from_path() {
        assert_eq!(project_name_from("/home/me/widgets"), "widgets");
        assert_eq!(project_name_from("/"), "project");
    }
}
