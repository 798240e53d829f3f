use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use crate::analysis;
use crate::errors::DocfreshError;
use crate::models::{
    AnalysisReport, AuditHistoryEntry, FullReport, Report, ReportStatus,
    ReportSummary, Severity,
};
use super::Database;

const REPORT_COLUMNS: &str = "id, project_id, status, total_files, critical_issues, major_issues, minor_issues, average_score, severity, report_md, analysis_raw, audit_raw, agent_output, error, created_at";

const HISTORY_SELECT: &str = "SELECT r.id, r.project_id, p.name, r.created_at, r.status, r.total_files, r.critical_issues, r.major_issues, r.minor_issues, r.average_score, r.severity FROM reports r JOIN projects p ON p.id = r.project_id";

fn parse_status(idx: usize, value: String) -> rusqlite::Result<ReportStatus> {
    value.parse::<ReportStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn row_to_report(row: &rusqlite::Row) -> rusqlite::Result<Report> {
    Ok(Report {
        id: row.get(0)?,
        project_id: row.get(1)?,
        status: parse_status(2, row.get(2)?)?,
        total_files: row.get(3)?,
        critical_issues: row.get(4)?,
        major_issues: row.get(5)?,
        minor_issues: row.get(6)?,
        average_score: row.get(7)?,
        severity: Severity::parse_lenient(&row.get::<_, String>(8)?),
        report_md: row.get(9)?,
        analysis_raw: row.get(10)?,
        audit_raw: row.get(11)?,
        agent_output: row.get(12)?,
        error: row.get(13)?,
        created_at: row.get(14)?,
    })
}

fn row_to_history(row: &rusqlite::Row) -> rusqlite::Result<AuditHistoryEntry> {
    Ok(AuditHistoryEntry {
        id: row.get(0)?,
        project_id: row.get(1)?,
        project_name: row.get(2)?,
        audit_date: row.get(3)?,
        status: parse_status(4, row.get(4)?)?,
        total_files: row.get(5)?,
        critical_issues: row.get(6)?,
        major_issues: row.get(7)?,
        minor_issues: row.get(8)?,
        average_score: row.get(9)?,
        severity: Severity::parse_lenient(&row.get::<_, String>(10)?),
    })
}

fn query_report(conn: &Connection, id: &str) -> Result<Option<Report>, DocfreshError> {
    conn.query_row(
        &format!("SELECT {} FROM reports WHERE id = ?1", REPORT_COLUMNS),
        rusqlite::params![id],
        row_to_report,
    )
    .optional()
    .map_err(|e| DocfreshError::Database(format!("Query error: {}", e)))
}

fn insert_report(
    conn: &Connection,
    project_id: &str,
    status: ReportStatus,
    analysis_raw: &str,
    audit_raw: &str,
    analysis: &AnalysisReport,
) -> Result<String, DocfreshError> {
    let id = uuid::Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO reports (id, project_id, status, total_files, critical_issues, major_issues, minor_issues, average_score, severity, analysis_raw, audit_raw, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        rusqlite::params![
            id,
            project_id,
            status.as_str(),
            analysis.total_files,
            analysis.critical_issues,
            analysis.major_issues,
            analysis.minor_issues,
            analysis.average_score,
            analysis.severity.as_str(),
            analysis_raw,
            audit_raw,
            Utc::now().to_rfc3339(),
        ],
    ).map_err(|e| DocfreshError::Database(format!("Failed to create report: {}", e)))?;
    Ok(id)
}

impl Database {
    /// New report for a run that is about to start.
    pub fn create_report(&self, project_id: &str) -> Result<Report, DocfreshError> {
        let conn = self.lock()?;
        let id = insert_report(&conn, project_id, ReportStatus::Processing, "", "", &AnalysisReport::empty())?;
        query_report(&conn, &id)?
            .ok_or_else(|| DocfreshError::Database(format!("Report {} vanished after insert", id)))
    }

    /// New report holding a finished analysis that waits for the user to apply it.
    pub fn create_pending_report(
        &self,
        project_id: &str,
        analysis_raw: &str,
        audit_raw: &str,
    ) -> Result<Report, DocfreshError> {
        let analysis = analysis::normalize(analysis_raw);
        let conn = self.lock()?;
        let id = insert_report(&conn, project_id, ReportStatus::AwaitingUserInput, analysis_raw, audit_raw, &analysis)?;
        query_report(&conn, &id)?
            .ok_or_else(|| DocfreshError::Database(format!("Report {} vanished after insert", id)))
    }

    /// Update the status, and the draft when given. Returns false if no report matched.
    pub fn set_status(
        &self,
        id: &str,
        status: ReportStatus,
        agent_output: Option<&str>,
    ) -> Result<bool, DocfreshError> {
        let conn = self.lock()?;
        let affected = match agent_output {
            Some(output) => conn.execute(
                "UPDATE reports SET status = ?2, agent_output = ?3 WHERE id = ?1",
                rusqlite::params![id, status.as_str(), output],
            ),
            None => conn.execute(
                "UPDATE reports SET status = ?2 WHERE id = ?1",
                rusqlite::params![id, status.as_str()],
            ),
        }.map_err(|e| DocfreshError::Database(format!("Update failed: {}", e)))?;
        Ok(affected > 0)
    }

    /// Move a report from `from` to `to` in one statement. Returns false when the
    /// report is missing or no longer in `from`.
    pub fn transition_status(
        &self,
        id: &str,
        from: ReportStatus,
        to: ReportStatus,
    ) -> Result<bool, DocfreshError> {
        let conn = self.lock()?;
        let affected = conn.execute(
            "UPDATE reports SET status = ?3 WHERE id = ?1 AND status = ?2",
            rusqlite::params![id, from.as_str(), to.as_str()],
        ).map_err(|e| DocfreshError::Database(format!("Update failed: {}", e)))?;
        Ok(affected > 0)
    }

    /// Store a finished analysis on a running report and park it as
    /// `awaiting_user_input` until it is applied.
    pub fn store_preview(
        &self,
        id: &str,
        analysis_raw: &str,
        audit_raw: &str,
    ) -> Result<Option<Report>, DocfreshError> {
        let a = analysis::normalize(analysis_raw);
        let conn = self.lock()?;
        let affected = conn.execute(
            "UPDATE reports SET status = ?2, analysis_raw = ?3, audit_raw = ?4, total_files = ?5, critical_issues = ?6, major_issues = ?7, minor_issues = ?8, average_score = ?9, severity = ?10, error = NULL WHERE id = ?1",
            rusqlite::params![
                id,
                ReportStatus::AwaitingUserInput.as_str(),
                analysis_raw,
                audit_raw,
                a.total_files,
                a.critical_issues,
                a.major_issues,
                a.minor_issues,
                a.average_score,
                a.severity.as_str(),
            ],
        ).map_err(|e| DocfreshError::Database(format!("Failed to store preview: {}", e)))?;

        if affected == 0 {
            return Ok(None);
        }
        query_report(&conn, id)
    }

    pub fn set_failed(&self, id: &str, error: &str) -> Result<bool, DocfreshError> {
        let conn = self.lock()?;
        let affected = conn.execute(
            "UPDATE reports SET status = ?2, error = ?3 WHERE id = ?1",
            rusqlite::params![id, ReportStatus::Failed.as_str(), error],
        ).map_err(|e| DocfreshError::Database(format!("Update failed: {}", e)))?;
        Ok(affected > 0)
    }

    /// Mark a report completed. Aggregates are recomputed only when new analysis
    /// output is supplied; `None` leaves the stored analysis untouched.
    pub fn finalize_report(
        &self,
        id: &str,
        report_md: &str,
        analysis_raw: Option<&str>,
        audit_raw: Option<&str>,
    ) -> Result<Option<Report>, DocfreshError> {
        let analysis = analysis_raw.map(|raw| (raw, analysis::normalize(raw)));
        let conn = self.lock()?;

        let affected = match &analysis {
            Some((raw, a)) => conn.execute(
                "UPDATE reports SET status = ?2, report_md = ?3, analysis_raw = ?4, audit_raw = COALESCE(?5, audit_raw), total_files = ?6, critical_issues = ?7, major_issues = ?8, minor_issues = ?9, average_score = ?10, severity = ?11, error = NULL WHERE id = ?1",
                rusqlite::params![
                    id,
                    ReportStatus::Completed.as_str(),
                    report_md,
                    raw,
                    audit_raw,
                    a.total_files,
                    a.critical_issues,
                    a.major_issues,
                    a.minor_issues,
                    a.average_score,
                    a.severity.as_str(),
                ],
            ),
            None => conn.execute(
                "UPDATE reports SET status = ?2, report_md = ?3, audit_raw = COALESCE(?4, audit_raw), error = NULL WHERE id = ?1",
                rusqlite::params![id, ReportStatus::Completed.as_str(), report_md, audit_raw],
            ),
        }.map_err(|e| DocfreshError::Database(format!("Failed to finalize report: {}", e)))?;

        if affected == 0 {
            return Ok(None);
        }
        query_report(&conn, id)
    }

    pub fn get_report(&self, id: &str) -> Result<Option<Report>, DocfreshError> {
        let conn = self.lock()?;
        query_report(&conn, id)
    }

    /// Report joined with its project and the per-file analysis parsed from `analysis_raw`.
    pub fn get_full_report(&self, id: &str) -> Result<Option<FullReport>, DocfreshError> {
        let (report, project_name) = {
            let conn = self.lock()?;
            let Some(report) = query_report(&conn, id)? else {
                return Ok(None);
            };
            let name: String = conn.query_row(
                "SELECT name FROM projects WHERE id = ?1",
                rusqlite::params![report.project_id],
                |row| row.get(0),
            ).map_err(|e| DocfreshError::Database(format!("Query error: {}", e)))?;
            (report, name)
        };

        // Summary and files both come from one parse of the stored analysis.
        let analysis = analysis::normalize(&report.analysis_raw);
        Ok(Some(FullReport {
            summary: ReportSummary {
                total_files: analysis.total_files,
                critical_issues: analysis.critical_issues,
                major_issues: analysis.major_issues,
                minor_issues: analysis.minor_issues,
                average_freshness_score: analysis.average_score,
                overall_health: analysis.overall_health().to_string(),
            },
            id: report.id,
            project: project_name,
            project_id: report.project_id,
            audit_date: report.created_at,
            status: report.status,
            report_md: report.report_md,
            error: report.error,
            files: analysis.files,
        }))
    }

    pub fn list_reports_for_project(&self, project_id: &str) -> Result<Vec<AuditHistoryEntry>, DocfreshError> {
        self.history_query(
            &format!("{} WHERE r.project_id = ?1 ORDER BY r.created_at DESC, r.rowid DESC", HISTORY_SELECT),
            rusqlite::params![project_id],
        )
    }

    /// Every report across projects, newest first.
    pub fn get_audit_history(&self) -> Result<Vec<AuditHistoryEntry>, DocfreshError> {
        self.history_query(
            &format!("{} ORDER BY r.created_at DESC, r.rowid DESC", HISTORY_SELECT),
            [],
        )
    }

    fn history_query<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<AuditHistoryEntry>, DocfreshError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)
            .map_err(|e| DocfreshError::Database(format!("Query failed: {}", e)))?;
        let rows = stmt.query_map(params, row_to_history)
            .map_err(|e| DocfreshError::Database(format!("Query error: {}", e)))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| DocfreshError::Database(format!("Row error: {}", e)))?);
        }
        Ok(results)
    }
}
