//! Staging lifecycle errors

use std::path::PathBuf;
use thiserror::Error;

use super::state::StagingFailure;
use crate::git::GitError;

#[derive(Debug, Error)]
pub enum StagingError {
    /// The repository could not be inspected
    #[error("Repository unavailable at {path}: {source}")]
    RepositoryUnavailable {
        path: PathBuf,
        #[source]
        source: GitError,
    },

    /// Staging could not proceed at all
    #[error("Staging failed: {0}")]
    StagingFailed(#[source] GitError),

    /// A restoration plan broke one of its invariants
    #[error("Invalid restoration plan: {0}")]
    RestorationPlanInvalid(String),

    /// One or more files could not be unstaged
    #[error("Failed to restore {} file(s): {}", .failures.len(), format_failures(.failures))]
    RestorationFailed { failures: Vec<StagingFailure> },

    /// Restoration was already attempted for this session
    #[error("Restoration already attempted")]
    AlreadyAttempted,

    /// Lifecycle step called out of order
    #[error("Out of order: {0}")]
    OutOfOrder(&'static str),
}

fn format_failures(failures: &[StagingFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<StagingError> for commitwise_foundation::Error {
    fn from(e: StagingError) -> Self {
        commitwise_foundation::Error::Staging(e.to_string())
    }
}
