use std::path::{Path, PathBuf};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use crate::errors::DocfreshError;
use super::{FindingProducer, ProducerReport};

const MAX_COMMITS: usize = 500;

/// Supplies the last-modified timestamp of a file from git history,
/// falling back to the filesystem mtime outside a repository.
pub struct GitHistoryProducer;

#[async_trait]
impl FindingProducer for GitHistoryProducer {
    fn name(&self) -> &str {
        "git_history"
    }

    fn applies_to(&self, _relative: &Path) -> bool {
        true
    }

    async fn produce(&self, root: &Path, relative: &Path) -> Result<ProducerReport, DocfreshError> {
        let absolute = root.join(relative);
        let lookup = absolute.clone();
        let from_git = tokio::task::spawn_blocking(move || last_commit_time(&lookup))
            .await
            .map_err(|e| DocfreshError::Internal(format!("git lookup task failed: {}", e)))?
            .unwrap_or_else(|e| {
                tracing::debug!(path = %absolute.display(), error = %e, "No git history, using mtime");
                None
            });

        let last_updated = match from_git {
            Some(ts) => Some(ts),
            None => tokio::fs::metadata(&absolute)
                .await
                .ok()
                .and_then(|m| m.modified().ok())
                .map(DateTime::<Utc>::from),
        };

        Ok(ProducerReport {
            last_updated_iso: last_updated.map(|ts| ts.to_rfc3339()),
            ..Default::default()
        })
    }
}

/// Commit time of the most recent commit (within the last `MAX_COMMITS`) that changed `path`.
pub fn last_commit_time(path: &Path) -> Result<Option<DateTime<Utc>>, DocfreshError> {
    let repo = git2::Repository::discover(path)
        .map_err(|e| DocfreshError::Git(format!("Failed to open repo: {}", e)))?;
    let Some(repo_relative) = repo_relative_path(&repo, path)? else {
        return Ok(None);
    };

    let mut revwalk = repo.revwalk()
        .map_err(|e| DocfreshError::Git(format!("Failed to walk history: {}", e)))?;
    revwalk.push_head()
        .map_err(|e| DocfreshError::Git(format!("No HEAD: {}", e)))?;
    revwalk.set_sorting(git2::Sort::TIME)
        .map_err(|e| DocfreshError::Git(format!("Failed to sort history: {}", e)))?;

    for oid in revwalk.take(MAX_COMMITS) {
        let oid = oid.map_err(|e| DocfreshError::Git(format!("Bad revision: {}", e)))?;
        let commit = repo.find_commit(oid)
            .map_err(|e| DocfreshError::Git(format!("Failed to find commit: {}", e)))?;
        let tree = commit.tree()
            .map_err(|e| DocfreshError::Git(format!("Failed to read tree: {}", e)))?;

        let Ok(entry) = tree.get_path(&repo_relative) else { continue };
        let changed = match commit.parent(0) {
            Ok(parent) => parent
                .tree()
                .ok()
                .and_then(|t| t.get_path(&repo_relative).ok())
                .map_or(true, |prev| prev.id() != entry.id()),
            Err(_) => true,
        };

        if changed {
            let seconds = commit.time().seconds();
            return Ok(Utc.timestamp_opt(seconds, 0).single());
        }
    }

    Ok(None)
}

fn repo_relative_path(repo: &git2::Repository, path: &Path) -> Result<Option<PathBuf>, DocfreshError> {
    let Some(workdir) = repo.workdir() else { return Ok(None) };
    let workdir = workdir.canonicalize()?;
    let absolute = path.canonicalize()?;
    Ok(absolute.strip_prefix(&workdir).ok().map(Path::to_path_buf))
}
