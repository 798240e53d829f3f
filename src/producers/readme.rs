use std::path::Path;
use std::sync::LazyLock;
use async_trait::async_trait;
use regex::Regex;
use crate::errors::DocfreshError;
use crate::models::Severity;
use super::{display_path, AuditFinding, FindingProducer, ProducerReport};

const DOC_TYPE: &str = "readme";

static PATH_MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"`([\w./-]+\.(?:py|rs|js|ts|tsx|jsx|go|java|rb|sh|toml|yaml|yml|json|md|rst|txt|cfg|ini))`",
    )
    .expect("valid path mention regex")
});

/// Flags README references to files that no longer exist.
pub struct ReadmeProducer;

impl ReadmeProducer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ReadmeProducer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FindingProducer for ReadmeProducer {
    fn name(&self) -> &str {
        "readme"
    }

    fn applies_to(&self, relative: &Path) -> bool {
        relative
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .is_some_and(|n| matches!(n.as_str(), "readme.md" | "readme.rst" | "readme"))
    }

    async fn produce(&self, root: &Path, relative: &Path) -> Result<ProducerReport, DocfreshError> {
        let text = tokio::fs::read_to_string(root.join(relative)).await?;
        let readme_dir = root.join(relative.parent().unwrap_or(Path::new("")));
        let findings = stale_mentions(&text)
            .into_iter()
            .filter(|(_, mention)| !readme_dir.join(mention).exists() && !root.join(mention).exists())
            .map(|(line, mention)| AuditFinding {
                file_path: display_path(relative),
                doc_type: DOC_TYPE.to_string(),
                severity: Severity::Major,
                issue: format!("README references missing file '{}'", mention),
                location: format!("Line {}", line),
                expected: format!("'{}' exists in the project", mention),
                actual: "File not found".to_string(),
                impact: "Readers following the README hit a dead reference".to_string(),
                fix_priority: "Medium".to_string(),
            })
            .collect();

        Ok(ProducerReport {
            doc_type: Some(DOC_TYPE.to_string()),
            findings,
            coverage: None,
            last_updated_iso: None,
        })
    }
}

/// Backticked file paths with their 1-based line numbers, in document order.
fn stale_mentions(text: &str) -> Vec<(usize, String)> {
    text.lines()
        .enumerate()
        .flat_map(|(idx, line)| {
            PATH_MENTION
                .captures_iter(line)
                .map(move |caps| (idx + 1, caps[1].to_string()))
        })
        .filter(|(_, m)| !m.starts_with('/') && !m.contains(".."))
        .collect()
}
