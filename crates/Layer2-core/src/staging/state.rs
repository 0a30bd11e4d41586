//! Staging data model

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

// ============================================================================
// StagingState
// ============================================================================

/// Immutable snapshot of the index at one point in time.
///
/// Fields are private; a new capture always builds a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagingState {
    staged_files: BTreeSet<String>,
    captured_at: DateTime<Utc>,
    repository_path: PathBuf,
}

impl StagingState {
    pub fn new(
        staged_files: BTreeSet<String>,
        captured_at: DateTime<Utc>,
        repository_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            staged_files,
            captured_at,
            repository_path: repository_path.into(),
        }
    }

    /// Staged paths in sorted order
    pub fn staged_files(&self) -> &BTreeSet<String> {
        &self.staged_files
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn repository_path(&self) -> &Path {
        &self.repository_path
    }

    pub fn contains(&self, path: &str) -> bool {
        self.staged_files.contains(path)
    }

    pub fn is_empty(&self) -> bool {
        self.staged_files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.staged_files.len()
    }
}

// ============================================================================
// StagingFailure
// ============================================================================

/// One file that could not be staged or unstaged
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagingFailure {
    pub path: String,
    pub reason: String,
}

impl StagingFailure {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for StagingFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

// ============================================================================
// AutoStagingResult
// ============================================================================

/// Outcome of one auto-staging call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AutoStagingResult {
    /// Files this call left staged. Empty after an unwind unless an
    /// unstage during the unwind itself failed.
    pub staged_files: Vec<String>,
    /// Per-file failures, in the order they happened
    pub failed_files: Vec<StagingFailure>,
    /// Cancelled before every target was attempted
    pub aborted: bool,
    /// Targets left alone because they already had staged changes
    pub skipped_files: Vec<String>,
}

impl AutoStagingResult {
    pub fn is_success(&self) -> bool {
        self.failed_files.is_empty() && !self.aborted
    }

    /// Staged files that the unwind could not remove
    pub fn residue(&self) -> &[String] {
        if self.is_success() {
            &[]
        } else {
            &self.staged_files
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_iterates_sorted() {
        let files: BTreeSet<String> = ["b.go", "a.go", "c.go"].iter().map(|s| s.to_string()).collect();
        let state = StagingState::new(files, Utc::now(), "/repo");
        let order: Vec<_> = state.staged_files().iter().cloned().collect();
        assert_eq!(order, vec!["a.go", "b.go", "c.go"]);
        assert!(state.contains("b.go"));
        assert_eq!(state.repository_path(), Path::new("/repo"));
    }

    #[test]
    fn test_success_requires_no_failures_and_no_abort() {
        let mut result = AutoStagingResult::default();
        assert!(result.is_success());

        result.aborted = true;
        assert!(!result.is_success());

        result.aborted = false;
        result.failed_files.push(StagingFailure::new("c.go", "locked"));
        assert!(!result.is_success());
        assert_eq!(result.failed_files[0].to_string(), "c.go: locked");
    }
}
