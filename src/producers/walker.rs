use std::path::{Path, PathBuf};
use crate::errors::DocfreshError;
use super::display_path;

const DEFAULT_EXCLUDES: &[&str] = &[
    "node_modules", "vendor", "dist", "build", "__pycache__", "venv", "target", "site-packages",
];

#[derive(Debug, Clone)]
pub struct WalkOptions {
    pub exclude_dirs: Vec<String>,
    /// When non-empty, only files whose relative path matches one pattern are kept
    pub include: Vec<glob::Pattern>,
    pub max_file_bytes: u64,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            exclude_dirs: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
            include: Vec::new(),
            max_file_bytes: 500_000,
        }
    }
}

impl WalkOptions {
    pub fn with_include(mut self, patterns: &[String]) -> Result<Self, DocfreshError> {
        self.include = patterns
            .iter()
            .map(|p| {
                glob::Pattern::new(p)
                    .map_err(|e| DocfreshError::Config(format!("Invalid include pattern '{}': {}", p, e)))
            })
            .collect::<Result<_, _>>()?;
        Ok(self)
    }

    fn keeps(&self, relative: &Path) -> bool {
        if self.include.is_empty() {
            return true;
        }
        let rendered = display_path(relative);
        self.include.iter().any(|p| p.matches(&rendered))
    }
}

/// Every candidate file under `root`, as sorted paths relative to `root`.
///
/// Hidden entries, excluded directories, symlinks and oversized files are skipped.
pub fn collect_files(root: &Path, options: &WalkOptions) -> Result<Vec<PathBuf>, DocfreshError> {
    let mut files = Vec::new();
    walk_dir(root, root, options, &mut files)?;
    files.sort();
    Ok(files)
}

fn walk_dir(
    root: &Path,
    dir: &Path,
    options: &WalkOptions,
    files: &mut Vec<PathBuf>,
) -> Result<(), DocfreshError> {
    if !dir.is_dir() { return Ok(()); }

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();

        if name.starts_with('.') { continue; }

        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            if options.exclude_dirs.iter().any(|e| name == e.as_str()) { continue; }
            walk_dir(root, &path, options, files)?;
        } else if file_type.is_file() {
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            if size > options.max_file_bytes { continue; }
            let Ok(relative) = path.strip_prefix(root) else { continue };
            if options.keeps(relative) {
                files.push(relative.to_path_buf());
            }
        }
    }
    Ok(())
}
