//! Git Operations
//!
//! The capability surface the staging lifecycle depends on. `GitCli` is the
//! real implementation; `InMemoryGit` (feature `test-util`) is a double.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::status::GitStatus;
use crate::staging::StagingFailure;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum GitError {
    #[error("Not a git repository: {0}")]
    NotARepository(PathBuf),

    #[error("git {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("git {command} timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("git command cancelled")]
    Cancelled,

    #[error("No changes to commit")]
    NothingToCommit,

    #[error("Commit signing is not available: {0}")]
    SigningUnsupported(String),

    #[error("Failed to unstage {} file(s)", .0.len())]
    PartialUnstage(Vec<StagingFailure>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GitError {
    pub fn command_failed(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        GitError::CommandFailed {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, GitError::Cancelled)
    }
}

impl From<GitError> for commitwise_foundation::Error {
    fn from(e: GitError) -> Self {
        match e {
            GitError::Cancelled => commitwise_foundation::Error::Cancelled,
            GitError::Timeout { .. } => commitwise_foundation::Error::Timeout(e.to_string()),
            GitError::Io(io) => commitwise_foundation::Error::Io(io),
            other => commitwise_foundation::Error::Git(other.to_string()),
        }
    }
}

// ============================================================================
// GitOperations trait
// ============================================================================

/// Staging-state inspection and mutation primitives over one repository.
///
/// Every call takes the cancellation token it should honour. Restoration
/// passes a fresh token so it still runs after the workflow was cancelled.
#[async_trait]
pub trait GitOperations: Send + Sync {
    /// Absolute path of the repository root
    fn repository_root(&self) -> &Path;

    async fn status(&self, cancel: &CancellationToken) -> Result<GitStatus, GitError>;

    /// Paths currently recorded in the index
    async fn read_staging_state(
        &self,
        cancel: &CancellationToken,
    ) -> Result<BTreeSet<String>, GitError> {
        Ok(self.status(cancel).await?.staged_paths())
    }

    async fn stage_file(&self, path: &str, cancel: &CancellationToken) -> Result<(), GitError>;

    async fn unstage_file(&self, path: &str, cancel: &CancellationToken) -> Result<(), GitError>;

    /// Unstage every path independently; one failure never stops the rest.
    async fn unstage_files(
        &self,
        paths: &[String],
        cancel: &CancellationToken,
    ) -> Result<(), GitError> {
        let mut failures = Vec::new();

        for path in paths {
            match self.unstage_file(path, cancel).await {
                Ok(()) => debug!(path = %path, "unstaged"),
                Err(e) => {
                    warn!(path = %path, error = %e, "unstage failed");
                    failures.push(StagingFailure::new(path.clone(), e.to_string()));
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(GitError::PartialUnstage(failures))
        }
    }

    /// `git diff --cached`
    async fn staged_diff(&self, cancel: &CancellationToken) -> Result<String, GitError>;

    /// Create a commit from the index; returns the short hash
    async fn create_commit(
        &self,
        message: &str,
        sign: bool,
        cancel: &CancellationToken,
    ) -> Result<String, GitError>;
}
