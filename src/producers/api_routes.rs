use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use async_trait::async_trait;
use regex::Regex;
use crate::errors::DocfreshError;
use crate::models::Severity;
use super::{display_path, AuditFinding, FindingProducer, ProducerReport};

const DOC_EXTENSIONS: &[&str] = &["md", "rst", "txt"];

static ROUTE_DECORATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@(?:app|router)\.(get|post|put|delete|patch)\(\s*["']([^"']+)["']"#)
        .expect("valid route decorator regex")
});

/// A route declared with a web framework decorator.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredRoute {
    pub method: String,
    pub path: String,
    pub line: usize,
}

/// Flags Python API routes that no README or docs/ page mentions.
pub struct ApiRouteProducer;

impl ApiRouteProducer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ApiRouteProducer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FindingProducer for ApiRouteProducer {
    fn name(&self) -> &str {
        "api_routes"
    }

    fn applies_to(&self, relative: &Path) -> bool {
        relative.extension().is_some_and(|ext| ext == "py")
    }

    async fn produce(&self, root: &Path, relative: &Path) -> Result<ProducerReport, DocfreshError> {
        let source = tokio::fs::read_to_string(root.join(relative)).await?;
        let routes = declared_routes(&source);
        if routes.is_empty() {
            return Ok(ProducerReport::default());
        }

        let docs_root = root.to_path_buf();
        let sources = tokio::task::spawn_blocking(move || doc_sources(&docs_root))
            .await
            .map_err(|e| DocfreshError::Internal(format!("Docs lookup failed: {}", e)))?;
        let mut docs = String::new();
        for path in sources {
            // Unreadable pages simply do not count as documentation.
            if let Ok(text) = tokio::fs::read_to_string(&path).await {
                docs.push_str(&text);
                docs.push('\n');
            }
        }

        let findings = routes
            .into_iter()
            .filter(|route| !docs.contains(&route.path))
            .map(|route| AuditFinding {
                file_path: display_path(relative),
                doc_type: "api".to_string(),
                severity: Severity::Minor,
                issue: format!("Route {} {} is not documented", route.method, route.path),
                location: format!("Line {}", route.line),
                expected: format!("'{}' described in the README or docs/", route.path),
                actual: "No mention found".to_string(),
                impact: "API consumers cannot discover the endpoint".to_string(),
                fix_priority: "Low".to_string(),
            })
            .collect();

        Ok(ProducerReport {
            doc_type: None,
            findings,
            coverage: None,
            last_updated_iso: None,
        })
    }
}

/// Decorated routes with their 1-based line numbers, in source order.
pub fn declared_routes(source: &str) -> Vec<DeclaredRoute> {
    source
        .lines()
        .enumerate()
        .flat_map(|(idx, line)| {
            ROUTE_DECORATOR.captures_iter(line).map(move |caps| DeclaredRoute {
                method: caps[1].to_uppercase(),
                path: caps[2].to_string(),
                line: idx + 1,
            })
        })
        .collect()
}

/// Root README files plus every text page under `docs/`.
fn doc_sources(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    if let Ok(entries) = std::fs::read_dir(root) {
        for entry in entries.flatten() {
            let path = entry.path();
            let is_readme = entry
                .file_name()
                .to_string_lossy()
                .to_lowercase()
                .starts_with("readme");
            if is_readme && path.is_file() {
                found.push(path);
            }
        }
    }

    let mut pending = vec![root.join("docs")];
    while let Some(dir) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else { continue };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else if path
                .extension()
                .is_some_and(|ext| DOC_EXTENSIONS.iter().any(|d| ext == *d))
            {
                found.push(path);
            }
        }
    }
    found.sort();
    found
}
