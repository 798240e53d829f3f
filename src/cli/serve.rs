use crate::cli::commands::ServeArgs;
use crate::errors::DocfreshError;
use crate::api;
use tracing::info;

pub async fn handle_serve(args: ServeArgs) -> Result<(), DocfreshError> {
    let config = super::resolve_config(args.config.as_deref()).await?;
    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);
    let db_path = args.db.unwrap_or_else(|| config.server.db_path.clone());
    info!(host = %host, port, db = %db_path, "Starting API server");

    let state = api::create_app_state(&db_path, config.pipeline_config()?).await?;
    let app = api::build_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| DocfreshError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
