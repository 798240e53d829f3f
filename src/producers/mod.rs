//! Finding producers: stateless analyzers that inspect one project file and
//! report documentation evidence for the audit stage.

pub mod api_routes;
pub mod docstring;
pub mod git_history;
pub mod readme;
pub mod walker;

use std::path::Path;
use std::sync::Arc;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::errors::DocfreshError;
use crate::models::Severity;

pub use api_routes::ApiRouteProducer;
pub use docstring::DocstringProducer;
pub use git_history::GitHistoryProducer;
pub use readme::ReadmeProducer;
pub use walker::{collect_files, WalkOptions};

/// One documentation discrepancy, serialized as a finding-list row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditFinding {
    pub file_path: String,
    pub doc_type: String,
    pub severity: Severity,
    pub issue: String,
    pub location: String,
    pub expected: String,
    pub actual: String,
    pub impact: String,
    pub fix_priority: String,
}

/// Function and parameter documentation counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DocCoverage {
    pub total_functions: u32,
    pub functions_with_docstrings: u32,
    pub total_params: u32,
    pub documented_params: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProducerReport {
    /// Set when the producer recognized the file as documentation it understands
    pub doc_type: Option<String>,
    pub findings: Vec<AuditFinding>,
    pub coverage: Option<DocCoverage>,
    pub last_updated_iso: Option<String>,
}

#[async_trait]
pub trait FindingProducer: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the producer inspects `relative` (a path inside the project root).
    fn applies_to(&self, relative: &Path) -> bool;

    async fn produce(&self, root: &Path, relative: &Path) -> Result<ProducerReport, DocfreshError>;
}

/// The built-in producer set used by the default audit stage.
pub fn default_producers() -> Vec<Arc<dyn FindingProducer>> {
    vec![
        Arc::new(DocstringProducer::new()),
        Arc::new(ReadmeProducer::new()),
        Arc::new(GitHistoryProducer),
        Arc::new(ApiRouteProducer::new()),
    ]
}

/// Relative path rendered with forward slashes on every platform.
pub fn display_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
