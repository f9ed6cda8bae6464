//! Git CLI wrapper for producing the pull request diff.
//!
//! Shells out to `git` via `tokio::process::Command`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use diffwise_core::constants::{BASE_BRANCH, BASE_REMOTE, INTER_HUNK_CONTEXT};
use diffwise_core::DiffwiseError;
use tracing::{debug, warn};

/// Source of the diff a run reviews.
///
/// Returns an empty string when the branch has no changes.
#[async_trait]
pub trait DiffSource: Send + Sync {
    /// Produce the diff of the current checkout against the base branch.
    async fn diff(&self) -> Result<String, DiffwiseError>;
}

/// Diff of `HEAD` against the remote base branch, computed by the `git` CLI.
///
/// # Examples
///
/// ```
/// use diffwise_review::git::GitDiff;
///
/// let git = GitDiff::new(".");
/// assert_eq!(git.repo_root().to_str(), Some("."));
/// ```
#[derive(Debug, Clone)]
pub struct GitDiff {
    repo_root: PathBuf,
}

impl GitDiff {
    /// Create a runner for the checkout at `repo_root`.
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    /// Checkout the commands run in.
    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    async fn run_git(&self, args: &[String]) -> Result<String, DiffwiseError> {
        debug!(?args, repo = %self.repo_root.display(), "running git");
        let output = tokio::process::Command::new("git")
            .args(args)
            .current_dir(&self.repo_root)
            .output()
            .await
            .map_err(|e| DiffwiseError::Git(format!("failed to run git: {e}")))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();

        if !output.status.success() {
            return Err(DiffwiseError::Git(format!(
                "git {} failed ({}): {stderr}",
                args.first().map(String::as_str).unwrap_or_default(),
                output.status
            )));
        }

        // Fetch reports progress here, so a successful exit wins.
        if !stderr.is_empty() {
            warn!(command = ?args.first(), "git stderr: {stderr}");
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl DiffSource for GitDiff {
    async fn diff(&self) -> Result<String, DiffwiseError> {
        self.run_git(&fetch_args()).await?;
        self.run_git(&diff_args()).await
    }
}

/// Arguments of `git fetch origin main`.
pub fn fetch_args() -> Vec<String> {
    vec!["fetch".into(), BASE_REMOTE.into(), BASE_BRANCH.into()]
}

/// Arguments of `git diff --inter-hunk-context=1000 origin/main...HEAD`.
///
/// The three-dot range diffs against the merge base, so commits that landed
/// on the base after the branch was cut do not show up.
pub fn diff_args() -> Vec<String> {
    vec![
        "diff".into(),
        format!("--inter-hunk-context={INTER_HUNK_CONTEXT}"),
        format!("{BASE_REMOTE}/{BASE_BRANCH}...HEAD"),
    ]
}
