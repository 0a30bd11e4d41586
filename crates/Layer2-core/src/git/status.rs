//! Git status parsing
//!
//! Parses `git status --porcelain=v1 -z --untracked-files=all --no-renames`.

use std::collections::BTreeSet;

// ============================================================================
// Status Types
// ============================================================================

/// One entry of the porcelain status output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// Index column (`X`)
    pub index: char,
    /// Worktree column (`Y`)
    pub worktree: char,
    /// Path relative to the repository root
    pub path: String,
    /// Source path for renames and copies
    pub orig_path: Option<String>,
}

impl StatusEntry {
    pub fn new(index: char, worktree: char, path: impl Into<String>) -> Self {
        Self {
            index,
            worktree,
            path: path.into(),
            orig_path: None,
        }
    }

    /// Has a change recorded in the index
    pub fn is_staged(&self) -> bool {
        !matches!(self.index, ' ' | '?' | '!')
    }

    /// Tracked file with worktree changes (modified, type change or deleted)
    pub fn is_modified(&self) -> bool {
        matches!(self.worktree, 'M' | 'T' | 'D') && !self.is_untracked()
    }

    pub fn is_untracked(&self) -> bool {
        self.index == '?' && self.worktree == '?'
    }

    pub fn is_ignored(&self) -> bool {
        self.index == '!'
    }

    /// Both index and worktree carry changes
    pub fn is_partially_staged(&self) -> bool {
        self.is_staged() && self.worktree != ' '
    }
}

/// Parsed repository status
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitStatus {
    pub entries: Vec<StatusEntry>,
}

impl GitStatus {
    pub fn new(entries: Vec<StatusEntry>) -> Self {
        Self { entries }
    }

    /// Paths whose index column records a change. A staged rename
    /// contributes both sides, since its source is a staged deletion.
    pub fn staged_paths(&self) -> BTreeSet<String> {
        let mut paths = BTreeSet::new();
        for entry in self.entries.iter().filter(|e| e.is_staged()) {
            paths.insert(entry.path.clone());
            if entry.index == 'R' {
                if let Some(orig) = &entry.orig_path {
                    paths.insert(orig.clone());
                }
            }
        }
        paths
    }

    pub fn modified(&self) -> impl Iterator<Item = &StatusEntry> {
        self.entries.iter().filter(|e| e.is_modified())
    }

    pub fn untracked(&self) -> impl Iterator<Item = &StatusEntry> {
        self.entries.iter().filter(|e| e.is_untracked())
    }

    pub fn is_clean(&self) -> bool {
        self.entries.iter().all(|e| e.is_ignored())
    }

    /// Parse NUL-separated porcelain v1 output
    pub fn parse_porcelain_z(raw: &[u8]) -> Result<Self, String> {
        let text = String::from_utf8_lossy(raw);
        let mut fields = text.split('\0').filter(|f| !f.is_empty());
        let mut entries = Vec::new();

        while let Some(field) = fields.next() {
            let mut chars = field.chars();
            let (Some(index), Some(worktree), Some(' ')) = (chars.next(), chars.next(), chars.next())
            else {
                return Err(format!("malformed status entry: {:?}", field));
            };
            let path: String = chars.collect();
            if path.is_empty() {
                return Err(format!("status entry without path: {:?}", field));
            }

            // rename/copy: the source path follows as its own field
            let orig_path = if matches!(index, 'R' | 'C') || matches!(worktree, 'R' | 'C') {
                Some(
                    fields
                        .next()
                        .ok_or_else(|| format!("rename without source path: {:?}", field))?
                        .to_string(),
                )
            } else {
                None
            };

            entries.push(StatusEntry {
                index,
                worktree,
                path,
                orig_path,
            });
        }

        Ok(Self { entries })
    }
}
