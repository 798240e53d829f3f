pub mod routes;
pub mod models;
pub mod errors;

use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use crate::db::Database;
use crate::errors::DocfreshError;
use crate::pipeline::{PipelineConfig, PipelineCoordinator};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub coordinator: PipelineCoordinator,
}

impl AppState {
    pub fn new(db: Database, config: PipelineConfig) -> Self {
        let coordinator = PipelineCoordinator::new(db.clone(), config);
        Self { db, coordinator }
    }
}

pub async fn create_app_state(db_path: &str, config: PipelineConfig) -> Result<AppState, DocfreshError> {
    let db = Database::new(db_path)?;
    Ok(AppState::new(db, config))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(routes::health::health_check))
        .route("/analyze/start", post(routes::analyze::start_analysis))
        .route("/analyze/preview", post(routes::analyze::preview_analysis))
        .route("/analyze/{report_id}/apply", post(routes::analyze::apply_suggestions))
        .route("/hitl/status/{report_id}", get(routes::hitl::get_status))
        .route("/hitl/feedback", post(routes::hitl::submit_feedback))
        .route("/history", get(routes::reports::get_history))
        .route("/reports/{report_id}", get(routes::reports::get_report))
        .route("/projects", get(routes::projects::list_projects))
        .route("/projects/find", get(routes::projects::find_project))
        .route("/projects/{id}", get(routes::projects::get_project))
        .route("/projects/{id}/reports", get(routes::projects::list_project_reports))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
