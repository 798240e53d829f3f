use std::path::Path;
use crate::errors::DocfreshError;
use super::types::DocfreshConfig;
use super::security::validate_security_patterns;
use super::schema::CONFIG_SCHEMA;
use tracing::{debug, warn};

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "docfresh.yaml";

pub async fn parse_config(path: &Path) -> Result<DocfreshConfig, DocfreshError> {
    if !path.exists() {
        return Err(DocfreshError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > 1_048_576 {
        return Err(DocfreshError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    if content.trim().is_empty() {
        return Ok(DocfreshConfig::default());
    }
    let yaml: serde_yaml::Value = serde_yaml::from_str(&content)?;

    // Security pattern validation
    validate_security_patterns(&yaml)?;

    // JSON Schema validation
    validate_schema(&yaml)?;

    // Parse into typed config
    let config: DocfreshConfig = serde_yaml::from_value(yaml)?;

    // Semantic conflict detection
    validate_conflicts(&config)?;

    Ok(config)
}

/// Explicit file when given, else `docfresh.yaml` if present, else defaults.
pub async fn load_config(path: Option<&Path>) -> Result<DocfreshConfig, DocfreshError> {
    match path {
        Some(path) => parse_config(path).await,
        None => {
            let fallback = Path::new(DEFAULT_CONFIG_FILE);
            if fallback.exists() {
                debug!(path = %fallback.display(), "Using config from working directory");
                parse_config(fallback).await
            } else {
                Ok(DocfreshConfig::default())
            }
        }
    }
}

/// Validate config against the JSON schema for structural correctness.
fn validate_schema(yaml: &serde_yaml::Value) -> Result<(), DocfreshError> {
    // Convert YAML value to JSON for schema validation
    let json_str = serde_json::to_string(yaml)
        .map_err(|e| DocfreshError::Config(format!("Config conversion error: {}", e)))?;
    let json_value: serde_json::Value = serde_json::from_str(&json_str)
        .map_err(|e| DocfreshError::Config(format!("Config conversion error: {}", e)))?;

    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| DocfreshError::Config(format!("Schema compilation error: {}", e)))?;

    let result = compiled.validate(&json_value);
    if let Err(errors) = result {
        // Advisory only; the typed parse and conflict checks are authoritative.
        for e in errors {
            warn!(validation_error = %format!("{} at {}", e, e.instance_path), "Config schema warning");
        }
    }

    Ok(())
}

/// Detect semantic conflicts in the parsed configuration.
fn validate_conflicts(config: &DocfreshConfig) -> Result<(), DocfreshError> {
    config.scoring.validate()?;

    for pattern in &config.pipeline.include {
        glob::Pattern::new(pattern)
            .map_err(|e| DocfreshError::Config(format!("Invalid include pattern '{}': {}", pattern, e)))?;
    }

    if config.pipeline.hitl_timeout_secs == Some(0) {
        return Err(DocfreshError::Config("pipeline.hitl_timeout_secs must be at least 1".into()));
    }
    if config.pipeline.max_file_bytes == 0 {
        return Err(DocfreshError::Config("pipeline.max_file_bytes must be positive".into()));
    }
    if !config.pipeline.human_review && config.pipeline.hitl_timeout_secs.is_some() {
        warn!("hitl_timeout_secs has no effect while human_review is disabled");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_parse_valid_config() {
        let file = write_config(
            "server:\n  port: 9000\npipeline:\n  human_review: false\nscoring:\n  weights:\n    structural: 0.25\n    semantic: 0.25\n    recency: 0.25\n    completeness: 0.25\n",
        );
        let config = parse_config(file.path()).await.unwrap();
        assert_eq!(config.server.port, 9000);
        assert!(!config.pipeline.human_review);
        assert_eq!(config.scoring.weights.structural, 0.25);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = parse_config(Path::new("/nonexistent/docfresh.yaml")).await.unwrap_err();
        assert!(matches!(err, DocfreshError::Config(_)));
    }

    #[tokio::test]
    async fn test_empty_file_yields_defaults() {
        let file = write_config("  \n");
        let config = parse_config(file.path()).await.unwrap();
        assert_eq!(config.server.port, 8000);
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let file = write_config("pipeline:\n  include: ['../outside/**']\n");
        assert!(matches!(parse_config(file.path()).await, Err(DocfreshError::Config(_))));
    }

    #[test]
    fn test_validate_conflicts_weights() {
        let mut config = DocfreshConfig::default();
        config.scoring.weights.recency = 0.5;
        assert!(validate_conflicts(&config).is_err());
    }

    #[test]
    fn test_validate_conflicts_thresholds() {
        let mut config = DocfreshConfig::default();
        config.scoring.critical_below = 80.0;
        assert!(validate_conflicts(&config).is_err());
    }

    #[test]
    fn test_validate_conflicts_zero_timeout() {
        let mut config = DocfreshConfig::default();
        config.pipeline.hitl_timeout_secs = Some(0);
        assert!(validate_conflicts(&config).is_err());
    }

    #[test]
    fn test_validate_conflicts_bad_glob() {
        let mut config = DocfreshConfig::default();
        config.pipeline.include = vec!["[".to_string()];
        assert!(validate_conflicts(&config).is_err());
    }

    #[test]
    fn test_validate_conflicts_default_config() {
        assert!(validate_conflicts(&DocfreshConfig::default()).is_ok());
    }
}
