use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use crate::api::models::{AnalyzeRequest, ApplyRequest};
use crate::api::AppState;
use crate::errors::DocfreshError;

pub async fn start_analysis(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<Value>, DocfreshError> {
    let started = state.coordinator.start(&req.project_name, &req.project_path)?;
    Ok(Json(serde_json::to_value(started)?))
}

/// Starts the analysis stages in the background; poll the status until the
/// report is `awaiting_user_input`, then apply.
pub async fn preview_analysis(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<Value>, DocfreshError> {
    let started = state.coordinator.preview(&req.project_name, &req.project_path)?;
    Ok(Json(serde_json::to_value(started)?))
}

pub async fn apply_suggestions(
    State(state): State<AppState>,
    Path(report_id): Path<String>,
    body: Option<Json<ApplyRequest>>,
) -> Result<Json<Value>, DocfreshError> {
    let feedback = body.map(|Json(req)| req.feedback).unwrap_or_default();
    let started = state.coordinator.apply(&report_id, &feedback)?;
    Ok(Json(serde_json::to_value(started)?))
}
