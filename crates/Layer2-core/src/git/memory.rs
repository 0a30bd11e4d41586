//! In-memory git double
//!
//! Models the index as sets of paths and lets tests inject failures,
//! delays and hangs into individual operations.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::ops::{GitError, GitOperations};
use super::status::{GitStatus, StatusEntry};

#[derive(Debug, Default)]
struct Index {
    /// Paths whose index entry differs from HEAD
    staged: BTreeSet<String>,
    /// Staged paths that do not exist in HEAD
    added: BTreeSet<String>,
    /// Tracked paths whose worktree differs from the index
    modified: BTreeSet<String>,
    untracked: BTreeSet<String>,
}

/// Recorded commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryCommit {
    pub hash: String,
    pub message: String,
    pub signed: bool,
    pub files: BTreeSet<String>,
}

/// `GitOperations` over an in-memory index
#[derive(Debug)]
pub struct InMemoryGit {
    root: PathBuf,
    index: Mutex<Index>,
    commits: Mutex<Vec<MemoryCommit>>,
    fail_stage: Mutex<HashSet<String>>,
    fail_unstage: Mutex<HashSet<String>>,
    stage_delay: Mutex<Option<Duration>>,
    hang_unstage: AtomicBool,
    unavailable: AtomicBool,
    signing_unsupported: AtomicBool,
    stage_calls: AtomicUsize,
    unstage_calls: AtomicUsize,
    commit_calls: AtomicUsize,
}

impl Default for InMemoryGit {
    fn default() -> Self {
        Self::new("/repo")
    }
}

impl InMemoryGit {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            index: Mutex::new(Index::default()),
            commits: Mutex::new(Vec::new()),
            fail_stage: Mutex::new(HashSet::new()),
            fail_unstage: Mutex::new(HashSet::new()),
            stage_delay: Mutex::new(None),
            hang_unstage: AtomicBool::new(false),
            unavailable: AtomicBool::new(false),
            signing_unsupported: AtomicBool::new(false),
            stage_calls: AtomicUsize::new(0),
            unstage_calls: AtomicUsize::new(0),
            commit_calls: AtomicUsize::new(0),
        }
    }

    // ------------------------------------------------------------------------
    // Setup
    // ------------------------------------------------------------------------

    /// Tracked files already staged before the run
    pub fn with_staged<I, S>(self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.index.lock().staged.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Tracked files with unstaged worktree changes
    pub fn with_modified<I, S>(self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.index.lock().modified.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn with_untracked<I, S>(self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.index.lock().untracked.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Files with staged hunks and further worktree changes
    pub fn with_partially_staged<I, S>(self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        {
            let mut index = self.index.lock();
            for path in paths {
                let path = path.into();
                index.staged.insert(path.clone());
                index.modified.insert(path);
            }
        }
        self
    }

    pub fn fail_stage_on(self, path: impl Into<String>) -> Self {
        self.fail_stage.lock().insert(path.into());
        self
    }

    pub fn fail_unstage_on(self, path: impl Into<String>) -> Self {
        self.fail_unstage.lock().insert(path.into());
        self
    }

    /// Every stage call takes `delay` (cancellable)
    pub fn with_stage_delay(self, delay: Duration) -> Self {
        *self.stage_delay.lock() = Some(delay);
        self
    }

    /// Unstage calls never return
    pub fn with_hanging_unstage(self) -> Self {
        self.hang_unstage.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_signing_unsupported(self) -> Self {
        self.signing_unsupported.store(true, Ordering::SeqCst);
        self
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Stage a path out-of-band, as the user would from another terminal
    pub fn stage_externally(&self, path: impl Into<String>) {
        let path = path.into();
        let mut index = self.index.lock();
        index.modified.remove(&path);
        if index.untracked.remove(&path) {
            index.added.insert(path.clone());
        }
        index.staged.insert(path);
    }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    pub fn staged(&self) -> BTreeSet<String> {
        self.index.lock().staged.clone()
    }

    pub fn commits(&self) -> Vec<MemoryCommit> {
        self.commits.lock().clone()
    }

    pub fn stage_calls(&self) -> usize {
        self.stage_calls.load(Ordering::SeqCst)
    }

    pub fn unstage_calls(&self) -> usize {
        self.unstage_calls.load(Ordering::SeqCst)
    }

    pub fn commit_calls(&self) -> usize {
        self.commit_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self, command: &str) -> Result<(), GitError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(GitError::command_failed(
                command,
                "fatal: not a git repository (or any of the parent directories): .git",
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl GitOperations for InMemoryGit {
    fn repository_root(&self) -> &Path {
        &self.root
    }

    async fn status(&self, cancel: &CancellationToken) -> Result<GitStatus, GitError> {
        if cancel.is_cancelled() {
            return Err(GitError::Cancelled);
        }
        self.check_available("status")?;

        let index = self.index.lock();
        let paths: BTreeSet<&String> = index
            .staged
            .iter()
            .chain(index.modified.iter())
            .chain(index.untracked.iter())
            .collect();

        let entries = paths
            .into_iter()
            .map(|path| {
                if index.untracked.contains(path) {
                    return StatusEntry::new('?', '?', path.clone());
                }
                let x = match (index.staged.contains(path), index.added.contains(path)) {
                    (true, true) => 'A',
                    (true, false) => 'M',
                    _ => ' ',
                };
                let y = if index.modified.contains(path) { 'M' } else { ' ' };
                StatusEntry::new(x, y, path.clone())
            })
            .collect();

        Ok(GitStatus::new(entries))
    }

    async fn stage_file(&self, path: &str, cancel: &CancellationToken) -> Result<(), GitError> {
        self.stage_calls.fetch_add(1, Ordering::SeqCst);
        if cancel.is_cancelled() {
            return Err(GitError::Cancelled);
        }
        self.check_available("add")?;

        let delay = *self.stage_delay.lock();
        if let Some(delay) = delay {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => return Err(GitError::Cancelled),
            }
        }

        if self.fail_stage.lock().contains(path) {
            return Err(GitError::command_failed(
                "add",
                format!("error: unable to index file '{}'", path),
            ));
        }

        let mut index = self.index.lock();
        if index.untracked.remove(path) {
            index.added.insert(path.to_string());
            index.staged.insert(path.to_string());
        } else if index.modified.remove(path) || index.staged.contains(path) {
            index.staged.insert(path.to_string());
        } else {
            return Err(GitError::command_failed(
                "add",
                format!("fatal: pathspec '{}' did not match any files", path),
            ));
        }
        Ok(())
    }

    async fn unstage_file(&self, path: &str, _cancel: &CancellationToken) -> Result<(), GitError> {
        self.unstage_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available("reset")?;

        if self.hang_unstage.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        if self.fail_unstage.lock().contains(path) {
            return Err(GitError::command_failed(
                "reset",
                "fatal: Unable to create '.git/index.lock': File exists.",
            ));
        }

        let mut index = self.index.lock();
        if index.staged.remove(path) {
            if index.added.remove(path) {
                index.untracked.insert(path.to_string());
            } else {
                index.modified.insert(path.to_string());
            }
        }
        Ok(())
    }

    async fn staged_diff(&self, cancel: &CancellationToken) -> Result<String, GitError> {
        if cancel.is_cancelled() {
            return Err(GitError::Cancelled);
        }
        self.check_available("diff")?;

        let index = self.index.lock();
        Ok(index
            .staged
            .iter()
            .map(|p| format!("diff --git a/{p} b/{p}\n--- a/{p}\n+++ b/{p}\n@@ -1 +1 @@\n-old\n+new\n"))
            .collect())
    }

    async fn create_commit(
        &self,
        message: &str,
        sign: bool,
        cancel: &CancellationToken,
    ) -> Result<String, GitError> {
        self.commit_calls.fetch_add(1, Ordering::SeqCst);
        if cancel.is_cancelled() {
            return Err(GitError::Cancelled);
        }
        self.check_available("commit")?;

        let mut index = self.index.lock();
        if index.staged.is_empty() {
            return Err(GitError::NothingToCommit);
        }
        if sign && self.signing_unsupported.load(Ordering::SeqCst) {
            return Err(GitError::SigningUnsupported(
                "error: gpg failed to sign the data".into(),
            ));
        }

        let mut commits = self.commits.lock();
        let hash = format!("{:07x}", 0xc0ffee + commits.len());
        let files = std::mem::take(&mut index.staged);
        index.added.clear();
        commits.push(MemoryCommit {
            hash: hash.clone(),
            message: message.to_string(),
            signed: sign,
            files,
        });
        Ok(hash)
    }
}
