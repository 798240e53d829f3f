use chrono::Utc;
use crate::errors::DocfreshError;
use crate::models::Project;
use super::Database;

const PROJECT_COLUMNS: &str = "id, name, path, created_at";

fn row_to_project(row: &rusqlite::Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        path: row.get(2)?,
        created_at: row.get(3)?,
    })
}

impl Database {
    /// Return the project for `(name, path)`, creating it on first use.
    pub fn create_project(&self, name: &str, path: &str) -> Result<Project, DocfreshError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO projects (id, name, path, created_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![uuid::Uuid::new_v4().to_string(), name, path, Utc::now().to_rfc3339()],
        ).map_err(|e| DocfreshError::Database(format!("Failed to create project: {}", e)))?;

        conn.query_row(
            &format!("SELECT {} FROM projects WHERE name = ?1 AND path = ?2", PROJECT_COLUMNS),
            rusqlite::params![name, path],
            row_to_project,
        ).map_err(|e| DocfreshError::Database(format!("Failed to load project: {}", e)))
    }

    pub fn get_project(&self, id: &str) -> Result<Option<Project>, DocfreshError> {
        let conn = self.lock()?;
        let result = conn.query_row(
            &format!("SELECT {} FROM projects WHERE id = ?1", PROJECT_COLUMNS),
            rusqlite::params![id],
            row_to_project,
        );
        match result {
            Ok(p) => Ok(Some(p)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DocfreshError::Database(format!("Query error: {}", e))),
        }
    }

    pub fn find_project(&self, name: &str, path: &str) -> Result<Option<Project>, DocfreshError> {
        let conn = self.lock()?;
        let result = conn.query_row(
            &format!("SELECT {} FROM projects WHERE name = ?1 AND path = ?2", PROJECT_COLUMNS),
            rusqlite::params![name, path],
            row_to_project,
        );
        match result {
            Ok(p) => Ok(Some(p)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DocfreshError::Database(format!("Query error: {}", e))),
        }
    }

    pub fn list_projects(&self) -> Result<Vec<Project>, DocfreshError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            &format!("SELECT {} FROM projects ORDER BY created_at DESC, rowid DESC", PROJECT_COLUMNS)
        ).map_err(|e| DocfreshError::Database(format!("Query failed: {}", e)))?;

        let rows = stmt.query_map([], row_to_project)
            .map_err(|e| DocfreshError::Database(format!("Query error: {}", e)))?;

        let mut projects = Vec::new();
        for row in rows {
            projects.push(row.map_err(|e| DocfreshError::Database(format!("Row error: {}", e)))?);
        }
        Ok(projects)
    }
}
