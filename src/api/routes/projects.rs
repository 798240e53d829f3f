use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use crate::api::models::FindProjectQuery;
use crate::api::AppState;
use crate::errors::DocfreshError;

pub async fn list_projects(State(state): State<AppState>) -> Result<Json<Value>, DocfreshError> {
    let projects = state.db.list_projects()?;
    Ok(Json(json!({ "count": projects.len(), "projects": projects })))
}

pub async fn find_project(
    State(state): State<AppState>,
    Query(query): Query<FindProjectQuery>,
) -> Result<Json<Value>, DocfreshError> {
    let project = state
        .db
        .find_project(&query.name, &query.path)?
        .ok_or_else(|| DocfreshError::NotFound(format!("No project named '{}' at {}", query.name, query.path)))?;
    Ok(Json(serde_json::to_value(project)?))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, DocfreshError> {
    let project = state
        .db
        .get_project(&id)?
        .ok_or_else(|| DocfreshError::NotFound(format!("Project {} not found", id)))?;
    Ok(Json(serde_json::to_value(project)?))
}

pub async fn list_project_reports(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, DocfreshError> {
    if state.db.get_project(&id)?.is_none() {
        return Err(DocfreshError::NotFound(format!("Project {} not found", id)));
    }
    let reports = state.db.list_reports_for_project(&id)?;
    Ok(Json(json!({ "project_id": id, "count": reports.len(), "reports": reports })))
}
