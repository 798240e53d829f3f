use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use crate::api::AppState;
use crate::errors::DocfreshError;

pub async fn get_history(State(state): State<AppState>) -> Result<Json<Value>, DocfreshError> {
    let history = state.db.get_audit_history()?;
    Ok(Json(json!({ "count": history.len(), "audits": history })))
}

pub async fn get_report(
    State(state): State<AppState>,
    Path(report_id): Path<String>,
) -> Result<Json<Value>, DocfreshError> {
    let report = state
        .db
        .get_full_report(&report_id)?
        .ok_or_else(|| DocfreshError::NotFound(format!("Report {} not found", report_id)))?;
    Ok(Json(serde_json::to_value(report)?))
}
