//! Commit messages and commit creation
//!
//! - `conventional`: Conventional Commits model (parse / render)
//! - `validate`: `CommitRules` and `ValidationError`
//! - `committer`: signed commit with typed unsigned fallback

mod committer;
mod conventional;
mod validate;

pub use committer::{CommitOutcome, Committer};
pub use conventional::{ConventionalCommit, Footer};
pub use validate::{CommitRules, ValidationError};
