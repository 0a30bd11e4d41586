//! Commit creation with signed → unsigned fallback

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::git::{GitError, GitOperations};

/// A created commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Short hash
    pub hash: String,
    pub signed: bool,
}

/// Creates commits, falling back to unsigned only when signing is unsupported
pub struct Committer {
    git: Arc<dyn GitOperations>,
    sign: bool,
}

impl Committer {
    pub fn new(git: Arc<dyn GitOperations>, sign: bool) -> Self {
        Self { git, sign }
    }

    pub async fn commit(
        &self,
        message: &str,
        cancel: &CancellationToken,
    ) -> Result<CommitOutcome, GitError> {
        if self.git.read_staging_state(cancel).await?.is_empty() {
            return Err(GitError::NothingToCommit);
        }

        if self.sign {
            match self.git.create_commit(message, true, cancel).await {
                Ok(hash) => {
                    info!(hash = %hash, "created signed commit");
                    return Ok(CommitOutcome { hash, signed: true });
                }
                Err(GitError::SigningUnsupported(reason)) => {
                    warn!(reason = %reason, "signing unavailable; committing unsigned");
                }
                Err(e) => return Err(e),
            }
        }

        let hash = self.git.create_commit(message, false, cancel).await?;
        info!(hash = %hash, "created commit");
        Ok(CommitOutcome {
            hash,
            signed: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::InMemoryGit;

    #[tokio::test]
    async fn test_signed_when_supported() {
        let git = Arc::new(InMemoryGit::default().with_staged(["a.rs"]));
        let outcome = Committer::new(git.clone(), true)
            .commit("feat: a", &CancellationToken::new())
            .await
            .unwrap();
        assert!(outcome.signed);
        assert_eq!(git.commit_calls(), 1);
        assert!(git.commits()[0].signed);
    }

    #[tokio::test]
    async fn test_falls_back_to_unsigned() {
        let git = Arc::new(
            InMemoryGit::default()
                .with_staged(["a.rs"])
                .with_signing_unsupported(),
        );
        let outcome = Committer::new(git.clone(), true)
            .commit("feat: a", &CancellationToken::new())
            .await
            .unwrap();
        assert!(!outcome.signed);
        assert_eq!(git.commit_calls(), 2);
        assert_eq!(git.commits().len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_commit_is_not_retried() {
        let git = Arc::new(InMemoryGit::default().with_staged(["a.rs"]));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = Committer::new(git.clone(), true)
            .commit("feat: a", &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(git.commit_calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_index_skips_git_commit() {
        let git = Arc::new(InMemoryGit::default().with_modified(["a.rs"]));
        let err = Committer::new(git.clone(), false)
            .commit("feat: a", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GitError::NothingToCommit));
        assert_eq!(git.commit_calls(), 0);
    }
}
