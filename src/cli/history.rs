use console::style;
use crate::cli::commands::{HistoryArgs, ReportArgs};
use crate::errors::DocfreshError;
use crate::models::{AuditHistoryEntry, ReportStatus};

pub async fn handle_history(args: HistoryArgs) -> Result<(), DocfreshError> {
    let config = super::resolve_config(None).await?;
    let db = super::open_database(args.db.as_deref(), &config)?;
    let entries = match &args.project {
        Some(project_id) => db.list_reports_for_project(project_id)?,
        None => db.get_audit_history()?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("No audits recorded.");
        return Ok(());
    }
    for entry in &entries {
        println!("{}", format_entry(entry));
    }
    Ok(())
}

pub async fn handle_report(args: ReportArgs) -> Result<(), DocfreshError> {
    let config = super::resolve_config(None).await?;
    let db = super::open_database(args.db.as_deref(), &config)?;
    let report = db
        .get_full_report(&args.report_id)?
        .ok_or_else(|| DocfreshError::NotFound(format!("Report {} not found", args.report_id)))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.report_md.is_empty() {
        println!("Report {} has no markdown yet (status: {}).", report.id, report.status);
    } else {
        println!("{}", report.report_md);
    }
    Ok(())
}

fn format_entry(entry: &AuditHistoryEntry) -> String {
    let status = match entry.status {
        ReportStatus::Completed => style(entry.status.as_str()).green(),
        ReportStatus::Failed => style(entry.status.as_str()).red(),
        _ => style(entry.status.as_str()).yellow(),
    };
    format!(
        "{}  {}  {:<24} {:<20} files={} C/M/m={}/{}/{} avg={:.1}",
        style(&entry.id).cyan(),
        entry.audit_date,
        entry.project_name,
        status,
        entry.total_files,
        entry.critical_issues,
        entry.major_issues,
        entry.minor_issues,
        entry.average_score,
    )
}
