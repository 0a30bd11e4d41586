//! Staging session
//!
//! Ordering guard over capture → auto-stage → restore for one run.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::auto_stage::{AutoStageMode, AutoStager};
use super::capture::StagingStateCapturer;
use super::error::StagingError;
use super::restoration::{RestorationPlan, RestorationPlanner};
use super::state::{AutoStagingResult, StagingState};
use crate::git::GitOperations;

/// One run's staging lifecycle
pub struct StagingSession {
    git: Arc<dyn GitOperations>,
    pre_cli_state: Mutex<Option<StagingState>>,
    restore_attempted: AtomicBool,
}

impl StagingSession {
    pub fn new(git: Arc<dyn GitOperations>) -> Self {
        Self {
            git,
            pre_cli_state: Mutex::new(None),
            restore_attempted: AtomicBool::new(false),
        }
    }

    pub fn git(&self) -> &Arc<dyn GitOperations> {
        &self.git
    }

    /// Snapshot taken by `capture`, if any
    pub fn pre_cli_state(&self) -> Option<StagingState> {
        self.pre_cli_state.lock().clone()
    }

    /// Take the pre-run snapshot. Must be the first call, and only once.
    pub async fn capture(&self, cancel: &CancellationToken) -> Result<StagingState, StagingError> {
        let captured = self.pre_cli_state.lock().is_some();
        if captured {
            return Err(StagingError::OutOfOrder("staging state already captured"));
        }

        let state = StagingStateCapturer::new(self.git.clone())
            .capture(cancel)
            .await?;

        let mut slot = self.pre_cli_state.lock();
        if slot.is_some() {
            return Err(StagingError::OutOfOrder("staging state already captured"));
        }
        *slot = Some(state.clone());
        Ok(state)
    }

    pub async fn auto_stage(
        &self,
        mode: AutoStageMode,
        cancel: &CancellationToken,
    ) -> Result<AutoStagingResult, StagingError> {
        let captured = self.pre_cli_state.lock().is_some();
        if !captured {
            return Err(StagingError::OutOfOrder(
                "auto-staging requires a captured staging state",
            ));
        }
        AutoStager::new(self.git.clone())
            .stage_subset(mode, cancel)
            .await
    }

    /// Roll the index back to the pre-run snapshot. At most once per session.
    pub async fn restore(&self) -> Result<RestorationPlan, StagingError> {
        let pre = self
            .pre_cli_state()
            .ok_or(StagingError::RestorationPlanInvalid(
                "no pre-run staging state was captured".into(),
            ))?;

        if self.restore_attempted.swap(true, Ordering::SeqCst) {
            debug!("restoration already attempted; skipping");
            return Err(StagingError::AlreadyAttempted);
        }

        // the workflow token may already be cancelled
        let token = CancellationToken::new();
        let plan = RestorationPlanner::new(self.git.clone())
            .restore(&pre, &token)
            .await?;
        info!(unstaged = plan.files_to_unstage().len(), "staging area restored");
        Ok(plan)
    }

    pub fn restore_attempted(&self) -> bool {
        self.restore_attempted.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::InMemoryGit;

    #[tokio::test]
    async fn test_auto_stage_before_capture_is_out_of_order() {
        let git = Arc::new(InMemoryGit::default().with_modified(["a.go"]));
        let session = StagingSession::new(git.clone());

        let err = session
            .auto_stage(AutoStageMode::ModifiedOnly, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StagingError::OutOfOrder(_)));
        assert_eq!(git.stage_calls(), 0);
    }

    #[tokio::test]
    async fn test_capture_only_once() {
        let session = StagingSession::new(Arc::new(InMemoryGit::default()));
        let cancel = CancellationToken::new();
        session.capture(&cancel).await.unwrap();
        assert!(matches!(
            session.capture(&cancel).await,
            Err(StagingError::OutOfOrder(_))
        ));
    }

    #[tokio::test]
    async fn test_restore_at_most_once() {
        let git = Arc::new(InMemoryGit::default().with_modified(["a.go"]));
        let session = StagingSession::new(git.clone());
        let cancel = CancellationToken::new();

        session.capture(&cancel).await.unwrap();
        session.auto_stage(AutoStageMode::ModifiedOnly, &cancel).await.unwrap();

        let plan = session.restore().await.unwrap();
        assert_eq!(plan.files_to_unstage().len(), 1);
        assert!(matches!(
            session.restore().await,
            Err(StagingError::AlreadyAttempted)
        ));
        assert_eq!(git.unstage_calls(), 1);
    }

    #[tokio::test]
    async fn test_restore_runs_after_cancellation() {
        let git = Arc::new(InMemoryGit::default().with_staged(["a.go"]).with_modified(["b.go"]));
        let session = StagingSession::new(git.clone());
        let cancel = CancellationToken::new();

        session.capture(&cancel).await.unwrap();
        session.auto_stage(AutoStageMode::ModifiedOnly, &cancel).await.unwrap();
        cancel.cancel();

        session.restore().await.unwrap();
        assert_eq!(git.staged().into_iter().collect::<Vec<_>>(), vec!["a.go"]);
    }

    #[tokio::test]
    async fn test_restore_without_capture_is_invalid() {
        let session = StagingSession::new(Arc::new(InMemoryGit::default()));
        assert!(matches!(
            session.restore().await,
            Err(StagingError::RestorationPlanInvalid(_))
        ));
        assert!(!session.restore_attempted());
    }
}
