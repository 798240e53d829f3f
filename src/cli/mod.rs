pub mod audit;
pub mod commands;
pub mod history;
pub mod normalize;
pub mod render;
pub mod score;
pub mod serve;
pub mod validate;

pub use commands::{Cli, Commands};

use std::path::Path;
use tokio::io::AsyncReadExt;
use crate::config::{load_config, DocfreshConfig};
use crate::db::Database;
use crate::errors::DocfreshError;

/// Configuration from `--config`, the working directory, or defaults.
pub(crate) async fn resolve_config(path: Option<&str>) -> Result<DocfreshConfig, DocfreshError> {
    load_config(path.map(Path::new)).await
}

/// Database at `--db` when given, else the configured path.
pub(crate) fn open_database(db: Option<&str>, config: &DocfreshConfig) -> Result<Database, DocfreshError> {
    Database::new(db.unwrap_or(&config.server.db_path))
}

/// Contents of `input`, where "-" means stdin.
pub(crate) async fn read_input(input: &str) -> Result<String, DocfreshError> {
    if input == "-" {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        Ok(buf)
    } else {
        tokio::fs::read_to_string(input)
            .await
            .map_err(|e| DocfreshError::InvalidInput(format!("Cannot read {}: {}", input, e)))
    }
}
