//! Git CLI backend
//!
//! Runs `git` as a child process per operation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::ops::{GitError, GitOperations};
use super::status::GitStatus;

/// Time a mutating command may keep running after cancellation
const CANCEL_GRACE: Duration = Duration::from_secs(1);

/// Line git prints when `git commit` gives up after the signer failed
const COMMIT_OBJECT_FAILED: &str = "fatal: failed to write commit object";

/// Starts of git's own signer error lines
const SIGNER_ERRORS: &[&str] = &[
    "error: gpg failed to sign the data",
    "error: cannot run gpg",
    "error: ssh-keygen",
    "error: cannot run ssh-keygen",
    "error: couldn't load public key",
    "error: failed to get the ssh fingerprint",
];

/// Whether a command writes to the index or object store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
}

/// Git operations backed by the `git` executable
#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
    timeout: Duration,
}

impl GitCli {
    /// Locate the repository containing `path`
    pub async fn discover(path: impl AsRef<Path>, timeout: Duration) -> Result<Self, GitError> {
        let path = path.as_ref();
        let output = Command::new("git")
            .args(["rev-parse", "--show-toplevel"])
            .current_dir(path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(timeout, output).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(GitError::Timeout {
                    command: "rev-parse".into(),
                    timeout,
                })
            }
        };

        if !output.status.success() {
            return Err(GitError::NotARepository(path.to_path_buf()));
        }

        let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if root.is_empty() {
            return Err(GitError::NotARepository(path.to_path_buf()));
        }

        debug!(root = %root, "discovered repository");
        Ok(Self {
            root: PathBuf::from(root),
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Per-command timeout, e.g. once the project config is known
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run one git command, honouring the timeout and the cancellation token
    async fn run(
        &self,
        args: &[&str],
        stdin: Option<&str>,
        access: Access,
        cancel: &CancellationToken,
    ) -> Result<Output, GitError> {
        let command = args.first().copied().unwrap_or("git").to_string();
        if cancel.is_cancelled() {
            return Err(GitError::Cancelled);
        }

        debug!(args = ?args, "git");
        let mut child = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(input.as_bytes()).await?;
            drop(pipe);
        }

        let wait = child.wait_with_output();
        tokio::pin!(wait);

        let output = tokio::select! {
            result = &mut wait => result?,
            _ = tokio::time::sleep(self.timeout) => {
                warn!(command = %command, "git command timed out; killing");
                return Err(GitError::Timeout { command, timeout: self.timeout });
            }
            _ = cancel.cancelled() => {
                if access == Access::Write {
                    // let git release index.lock before the child is killed
                    if tokio::time::timeout(CANCEL_GRACE, &mut wait).await.is_err() {
                        warn!(command = %command, "git command ignored cancellation; killing");
                    }
                }
                return Err(GitError::Cancelled);
            }
        };

        if output.status.success() {
            Ok(output)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            Err(GitError::command_failed(command, stderr))
        }
    }

    async fn has_head(&self, cancel: &CancellationToken) -> Result<bool, GitError> {
        match self
            .run(&["rev-parse", "--verify", "-q", "HEAD"], None, Access::Read, cancel)
            .await
        {
            Ok(_) => Ok(true),
            Err(GitError::CommandFailed { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// A signer error line followed by the commit-object failure
fn is_signing_failure(stderr: &str) -> bool {
    if !stderr.contains(COMMIT_OBJECT_FAILED) {
        return false;
    }
    stderr.lines().any(|line| {
        let line = line.trim().to_lowercase();
        SIGNER_ERRORS.iter().any(|prefix| line.starts_with(prefix))
    })
}

#[async_trait]
impl GitOperations for GitCli {
    fn repository_root(&self) -> &Path {
        &self.root
    }

    async fn status(&self, cancel: &CancellationToken) -> Result<GitStatus, GitError> {
        let output = self
            .run(
                &[
                    "status",
                    "--porcelain=v1",
                    "-z",
                    "--untracked-files=all",
                    "--no-renames",
                ],
                None,
                Access::Read,
                cancel,
            )
            .await?;
        GitStatus::parse_porcelain_z(&output.stdout)
            .map_err(|e| GitError::command_failed("status", e))
    }

    async fn stage_file(&self, path: &str, cancel: &CancellationToken) -> Result<(), GitError> {
        self.run(&["add", "--", path], None, Access::Write, cancel)
            .await
            .map(|_| ())
    }

    async fn unstage_file(&self, path: &str, cancel: &CancellationToken) -> Result<(), GitError> {
        if self.has_head(cancel).await? {
            self.run(&["reset", "-q", "HEAD", "--", path], None, Access::Write, cancel)
                .await?;
        } else {
            // unborn branch: nothing to reset to
            self.run(
                &["rm", "--cached", "-q", "--ignore-unmatch", "--", path],
                None,
                Access::Write,
                cancel,
            )
            .await?;
        }
        Ok(())
    }

    async fn staged_diff(&self, cancel: &CancellationToken) -> Result<String, GitError> {
        let output = self
            .run(&["diff", "--cached", "--no-color"], None, Access::Read, cancel)
            .await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn create_commit(
        &self,
        message: &str,
        sign: bool,
        cancel: &CancellationToken,
    ) -> Result<String, GitError> {
        if self.read_staging_state(cancel).await?.is_empty() {
            return Err(GitError::NothingToCommit);
        }

        let sign_flag = if sign { "-S" } else { "--no-gpg-sign" };
        let result = self
            .run(
                &["commit", "-q", sign_flag, "-F", "-"],
                Some(message),
                Access::Write,
                cancel,
            )
            .await;

        match result {
            Ok(_) => {}
            Err(GitError::CommandFailed { stderr, .. }) if sign && is_signing_failure(&stderr) => {
                return Err(GitError::SigningUnsupported(stderr));
            }
            Err(e) => return Err(e),
        }

        let output = self
            .run(&["rev-parse", "--short", "HEAD"], None, Access::Read, cancel)
            .await?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
