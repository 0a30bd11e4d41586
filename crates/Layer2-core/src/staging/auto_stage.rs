//! Auto-staging
//!
//! Stages a file subset one file at a time and unwinds everything it staged
//! when any file fails or the run is cancelled.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::StagingError;
use super::state::{AutoStagingResult, StagingFailure};
use crate::git::{GitError, GitOperations, GitStatus};

/// Which files auto-staging targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoStageMode {
    /// Tracked files with worktree changes
    ModifiedOnly,
    /// Tracked files with worktree changes plus untracked files
    ModifiedAndUntracked,
}

impl AutoStageMode {
    pub fn includes_untracked(&self) -> bool {
        matches!(self, Self::ModifiedAndUntracked)
    }
}

/// Target files for a mode, and the ones left alone because they already
/// carry staged changes
fn select_targets(status: &GitStatus, mode: AutoStageMode) -> (Vec<String>, Vec<String>) {
    let mut targets = Vec::new();
    let mut skipped = Vec::new();

    for entry in &status.entries {
        let wanted = entry.is_modified() || (mode.includes_untracked() && entry.is_untracked());
        if !wanted {
            continue;
        }
        if entry.is_staged() {
            skipped.push(entry.path.clone());
        } else {
            targets.push(entry.path.clone());
        }
    }

    (targets, skipped)
}

/// Stages modified (and optionally untracked) files all-or-nothing
pub struct AutoStager {
    git: Arc<dyn GitOperations>,
}

impl AutoStager {
    pub fn new(git: Arc<dyn GitOperations>) -> Self {
        Self { git }
    }

    /// Stage the mode's target set.
    ///
    /// Fails only when the target set cannot be read. Per-file failures and
    /// cancellation are reported in the result after the unwind.
    pub async fn stage_subset(
        &self,
        mode: AutoStageMode,
        cancel: &CancellationToken,
    ) -> Result<AutoStagingResult, StagingError> {
        let status = match self.git.status(cancel).await {
            Ok(status) => status,
            Err(GitError::Cancelled) => {
                return Ok(AutoStagingResult {
                    aborted: true,
                    ..Default::default()
                })
            }
            Err(e) => return Err(StagingError::StagingFailed(e)),
        };

        let (targets, skipped_files) = select_targets(&status, mode);
        for path in &skipped_files {
            info!(path = %path, "already has staged changes; not auto-staging");
        }
        if targets.is_empty() {
            debug!(?mode, "nothing to auto-stage");
            return Ok(AutoStagingResult {
                skipped_files,
                ..Default::default()
            });
        }

        let mut staged = Vec::with_capacity(targets.len());
        let mut failed_files = Vec::new();
        let mut aborted = false;

        for path in targets {
            if cancel.is_cancelled() {
                aborted = true;
                break;
            }
            match self.git.stage_file(&path, cancel).await {
                Ok(()) => {
                    debug!(path = %path, "staged");
                    staged.push(path);
                }
                Err(GitError::Cancelled) => {
                    // the add may have landed before the child was stopped
                    aborted = true;
                    staged.push(path);
                    break;
                }
                Err(e) => {
                    warn!(path = %path, error = %e, "failed to stage");
                    failed_files.push(StagingFailure::new(path, e.to_string()));
                }
            }
        }

        let staged_files = if failed_files.is_empty() && !aborted {
            info!(count = staged.len(), "auto-staged files");
            staged
        } else {
            self.unwind(staged).await
        };

        Ok(AutoStagingResult {
            staged_files,
            failed_files,
            aborted,
            skipped_files,
        })
    }

    /// Unstage what this call staged; returns the paths that stayed staged.
    ///
    /// Runs on a fresh token so a cancelled workflow still gets unwound.
    async fn unwind(&self, staged: Vec<String>) -> Vec<String> {
        if staged.is_empty() {
            return staged;
        }
        info!(count = staged.len(), "unwinding auto-staged files");

        let unwind_token = CancellationToken::new();
        let mut residue = Vec::new();
        for path in staged {
            if let Err(e) = self.git.unstage_file(&path, &unwind_token).await {
                warn!(path = %path, error = %e, "unwind could not unstage file");
                residue.push(path);
            }
        }
        residue
    }
}
