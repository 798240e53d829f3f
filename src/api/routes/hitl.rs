use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use crate::api::models::FeedbackRequest;
use crate::api::AppState;
use crate::errors::DocfreshError;

pub async fn get_status(
    State(state): State<AppState>,
    Path(report_id): Path<String>,
) -> Result<Json<Value>, DocfreshError> {
    let status = state
        .coordinator
        .status(&report_id)
        .await?
        .ok_or_else(|| DocfreshError::NotFound(format!("Report {} not found", report_id)))?;
    Ok(Json(serde_json::to_value(status)?))
}

pub async fn submit_feedback(
    State(state): State<AppState>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<Value>, DocfreshError> {
    let ack = state.coordinator.feedback(&req.report_id, &req.feedback)?;
    Ok(Json(serde_json::to_value(ack)?))
}
