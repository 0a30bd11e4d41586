//! Staging state capture

use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::error::StagingError;
use super::state::StagingState;
use crate::git::GitOperations;

/// Takes snapshots of the staged file set
pub struct StagingStateCapturer {
    git: Arc<dyn GitOperations>,
}

impl StagingStateCapturer {
    pub fn new(git: Arc<dyn GitOperations>) -> Self {
        Self { git }
    }

    /// Snapshot the index. No side effects.
    pub async fn capture(&self, cancel: &CancellationToken) -> Result<StagingState, StagingError> {
        let root = self.git.repository_root().to_path_buf();
        let staged = self
            .git
            .read_staging_state(cancel)
            .await
            .map_err(|source| StagingError::RepositoryUnavailable {
                path: root.clone(),
                source,
            })?;

        debug!(count = staged.len(), "captured staging state");
        Ok(StagingState::new(staged, Utc::now(), root))
    }
}
