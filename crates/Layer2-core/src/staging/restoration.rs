//! Restoration planning
//!
//! A plan is always computed from a fresh read of the index, never cached:
//! the user may stage more files while the workflow is running.

use std::collections::BTreeSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::capture::StagingStateCapturer;
use super::error::StagingError;
use super::state::{StagingFailure, StagingState};
use crate::git::{GitError, GitOperations};

/// Rollback instructions from the current index back to a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestorationPlan {
    files_to_unstage: BTreeSet<String>,
    pre_cli_state: StagingState,
    current_state: StagingState,
}

impl RestorationPlan {
    /// Files staged during this run: `current − pre`
    pub fn compute(pre_cli_state: StagingState, current_state: StagingState) -> Self {
        let files_to_unstage = current_state
            .staged_files()
            .difference(pre_cli_state.staged_files())
            .cloned()
            .collect();

        Self {
            files_to_unstage,
            pre_cli_state,
            current_state,
        }
    }

    /// Build a plan with an explicit file set (validated before execution)
    pub fn with_files(
        files_to_unstage: BTreeSet<String>,
        pre_cli_state: StagingState,
        current_state: StagingState,
    ) -> Self {
        Self {
            files_to_unstage,
            pre_cli_state,
            current_state,
        }
    }

    pub fn files_to_unstage(&self) -> &BTreeSet<String> {
        &self.files_to_unstage
    }

    pub fn pre_cli_state(&self) -> &StagingState {
        &self.pre_cli_state
    }

    pub fn current_state(&self) -> &StagingState {
        &self.current_state
    }

    pub fn is_empty(&self) -> bool {
        self.files_to_unstage.is_empty()
    }

    /// Check the plan invariants
    pub fn validate(&self) -> Result<(), StagingError> {
        if self.pre_cli_state.repository_path() != self.current_state.repository_path() {
            return Err(StagingError::RestorationPlanInvalid(format!(
                "snapshots belong to different repositories ({} vs {})",
                self.pre_cli_state.repository_path().display(),
                self.current_state.repository_path().display()
            )));
        }

        let not_staged: Vec<&str> = self
            .files_to_unstage
            .iter()
            .filter(|p| !self.current_state.contains(p))
            .map(String::as_str)
            .collect();
        if !not_staged.is_empty() {
            return Err(StagingError::RestorationPlanInvalid(format!(
                "cannot unstage files that are not staged: {}",
                not_staged.join(", ")
            )));
        }

        let pre_existing: Vec<&str> = self
            .files_to_unstage
            .iter()
            .filter(|p| self.pre_cli_state.contains(p))
            .map(String::as_str)
            .collect();
        if !pre_existing.is_empty() {
            return Err(StagingError::RestorationPlanInvalid(format!(
                "plan would unstage files staged before the run: {}",
                pre_existing.join(", ")
            )));
        }

        Ok(())
    }
}

/// Computes, validates and executes restoration plans
pub struct RestorationPlanner {
    git: Arc<dyn GitOperations>,
    capturer: StagingStateCapturer,
}

impl RestorationPlanner {
    pub fn new(git: Arc<dyn GitOperations>) -> Self {
        Self {
            capturer: StagingStateCapturer::new(git.clone()),
            git,
        }
    }

    pub fn compute_plan(&self, pre: StagingState, current: StagingState) -> RestorationPlan {
        RestorationPlan::compute(pre, current)
    }

    /// Validate, then unstage every file independently.
    ///
    /// An empty plan is a no-op that never touches git.
    pub async fn execute(
        &self,
        plan: &RestorationPlan,
        cancel: &CancellationToken,
    ) -> Result<(), StagingError> {
        plan.validate()?;
        if plan.is_empty() {
            debug!("restoration plan is empty");
            return Ok(());
        }

        let paths: Vec<String> = plan.files_to_unstage().iter().cloned().collect();
        info!(count = paths.len(), "restoring staging area");

        match self.git.unstage_files(&paths, cancel).await {
            Ok(()) => Ok(()),
            Err(GitError::PartialUnstage(failures)) => {
                warn!(failed = failures.len(), "restoration incomplete");
                Err(StagingError::RestorationFailed { failures })
            }
            Err(e) => Err(StagingError::RestorationFailed {
                failures: paths
                    .into_iter()
                    .map(|p| StagingFailure::new(p, e.to_string()))
                    .collect(),
            }),
        }
    }

    /// Re-read the index and roll it back to `pre`; returns the executed plan
    pub async fn restore(
        &self,
        pre: &StagingState,
        cancel: &CancellationToken,
    ) -> Result<RestorationPlan, StagingError> {
        let current = self.capturer.capture(cancel).await?;
        let plan = self.compute_plan(pre.clone(), current);
        self.execute(&plan, cancel).await?;
        Ok(plan)
    }
}
