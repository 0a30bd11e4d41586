//! Git Integration Module
//!
//! - `ops`: the `GitOperations` capability and `GitError`
//! - `status`: porcelain status parsing
//! - `cli`: `GitCli`, the `git` executable backend
//! - `memory`: `InMemoryGit` test double (feature `test-util`)

pub mod cli;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod ops;
pub mod status;

pub use cli::GitCli;
#[cfg(any(test, feature = "test-util"))]
pub use memory::{InMemoryGit, MemoryCommit};
pub use ops::{GitError, GitOperations};
pub use status::{GitStatus, StatusEntry};
