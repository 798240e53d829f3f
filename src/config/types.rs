use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::errors::DocfreshError;
use crate::pipeline::PipelineConfig;
use crate::producers::WalkOptions;
use crate::scoring::ScoringPolicy;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DocfreshConfig {
    pub server: ServerConfig,
    pub pipeline: PipelineSection,
    pub scoring: ScoringPolicy,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            db_path: "./data/docfresh.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineSection {
    pub human_review: bool,
    /// Fail a report whose reviewer has not answered within this many seconds
    pub hitl_timeout_secs: Option<u64>,
    pub max_file_bytes: u64,
    /// Replaces the built-in list of skipped directories when set
    pub exclude_dirs: Option<Vec<String>>,
    /// Glob patterns over project-relative paths; empty keeps every file
    pub include: Vec<String>,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            human_review: true,
            hitl_timeout_secs: None,
            max_file_bytes: WalkOptions::default().max_file_bytes,
            exclude_dirs: None,
            include: Vec::new(),
        }
    }
}

impl DocfreshConfig {
    /// Runtime settings for the pipeline coordinator.
    pub fn pipeline_config(&self) -> Result<PipelineConfig, DocfreshError> {
        let mut walk = WalkOptions::default().with_include(&self.pipeline.include)?;
        walk.max_file_bytes = self.pipeline.max_file_bytes;
        if let Some(exclude) = &self.pipeline.exclude_dirs {
            walk.exclude_dirs = exclude.clone();
        }

        Ok(PipelineConfig {
            human_review: self.pipeline.human_review,
            hitl_timeout: self.pipeline.hitl_timeout_secs.map(Duration::from_secs),
            walk,
            scoring: self.scoring.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DocfreshConfig::default();
        assert_eq!(config.server.port, 8000);
        assert!(config.pipeline.human_review);
        assert!(config.pipeline.hitl_timeout_secs.is_none());
        assert_eq!(config.scoring, ScoringPolicy::default());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: DocfreshConfig = serde_yaml::from_str(
            "pipeline:\n  hitl_timeout_secs: 30\n  include: ['docs/**']\nscoring:\n  critical_below: 30\n",
        )
        .unwrap();
        assert_eq!(config.pipeline.hitl_timeout_secs, Some(30));
        assert!(config.pipeline.human_review);
        assert_eq!(config.scoring.critical_below, 30.0);
        assert_eq!(config.scoring.major_below, 70.0);
        assert_eq!(config.server.db_path, "./data/docfresh.db");
    }

    #[test]
    fn test_pipeline_config_conversion() {
        let mut config = DocfreshConfig::default();
        config.pipeline.hitl_timeout_secs = Some(5);
        config.pipeline.exclude_dirs = Some(vec!["generated".to_string()]);
        config.pipeline.include = vec!["**/*.md".to_string()];
        let pipeline = config.pipeline_config().unwrap();
        assert_eq!(pipeline.hitl_timeout, Some(Duration::from_secs(5)));
        assert_eq!(pipeline.walk.exclude_dirs, vec!["generated"]);
        assert_eq!(pipeline.walk.include.len(), 1);
    }
}
