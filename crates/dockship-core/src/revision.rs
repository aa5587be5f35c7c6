use std::path::{Path, PathBuf};
use std::process::Command;

/// Length of the commit identifier used for commit-pinned image tags.
pub const SHORT_COMMIT_LEN: usize = 6;

/// Source-control state of the working copy at the time of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionInfo {
    pub commit: String,
    pub short_commit: String,
    pub branch: String,
    /// Tags pointing exactly at `commit`
    pub tags: Vec<String>,
}

impl RevisionInfo {
    pub fn new(commit: impl Into<String>, branch: impl Into<String>, tags: Vec<String>) -> Self {
        let commit = commit.into();
        Self {
            short_commit: shorten(&commit),
            commit,
            branch: branch.into(),
            tags,
        }
    }
}

/// Truncate a commit hash to [`SHORT_COMMIT_LEN`] characters.
pub fn shorten(commit: &str) -> String {
    commit.chars().take(SHORT_COMMIT_LEN).collect()
}

/// Reads commit, branch and tags from the git working copy at `repo_dir`.
#[derive(Debug, Clone)]
pub struct RevisionResolver {
    repo_dir: PathBuf,
}

impl RevisionResolver {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
        }
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    /// Best-effort revision lookup.
    ///
    /// Returns `None` when there is no repository, HEAD is detached, or git
    /// is not installed; callers fall back to the project version.
    pub fn resolve(&self) -> Option<RevisionInfo> {
        match self.try_resolve() {
            Ok(info) => Some(info),
            Err(e) => {
                tracing::debug!(
                    dir = %self.repo_dir.display(),
                    error = %e,
                    "revision metadata unavailable"
                );
                None
            }
        }
    }

    fn try_resolve(&self) -> crate::Result<RevisionInfo> {
        let commit = self.git(&["rev-parse", "HEAD"])?;
        let branch = self.git(&["symbolic-ref", "--short", "-q", "HEAD"])?;
        let tags = self
            .git(&["tag", "--points-at", "HEAD"])?
            .lines()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .collect();
        Ok(RevisionInfo::new(commit, branch, tags))
    }

    /// Short commit of HEAD, queried fresh on every call.
    ///
    /// # Errors
    ///
    /// Fails if `repo_dir` is not inside a git repository or git cannot run.
    pub fn short_commit(&self) -> crate::Result<String> {
        let commit = self.git(&["rev-parse", "HEAD"])?;
        Ok(shorten(&commit))
    }

    fn git(&self, args: &[&str]) -> crate::Result<String> {
        let owned = || args.iter().map(|a| (*a).to_owned()).collect::<Vec<_>>();
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_dir)
            .output()
            .map_err(|e| crate::Error::GitCommand {
                args: owned(),
                source: e,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(crate::Error::GitFailed {
                args: owned(),
                stderr: format!("{}: {}", output.status, stderr.trim()),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
    }
}
