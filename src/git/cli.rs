//! Git operations for the commit pipeline.
//!
//! All operations use `std::process::Command` to shell out to the system `git`
//! binary with explicit argument arrays, inheriting the user's git config and
//! hooks. Nothing is ever passed through a shell.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use tracing::debug;

use crate::error::GitError;

/// Read buffer for full diffs (10 MiB). Larger output counts as a failed fetch.
pub const DEFAULT_DIFF_BUFFER: usize = 10 * 1024 * 1024;

/// Which change set a diff query describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffTarget {
    /// The index relative to HEAD (`git diff --cached`).
    Staged,
    /// The most recent commit (`git show HEAD`).
    LastCommit,
}

impl DiffTarget {
    fn args<'a>(self, extra: &[&'a str]) -> Vec<&'a str> {
        let mut args = match self {
            DiffTarget::Staged => vec!["diff", "--cached", "--no-color", "--no-ext-diff"],
            DiffTarget::LastCommit => vec!["show", "--format=", "--no-color", "--no-ext-diff"],
        };
        args.extend_from_slice(extra);
        if self == DiffTarget::LastCommit {
            args.push("HEAD");
        }
        args
    }
}

/// The version-control operations the pipeline consumes.
///
/// This abstraction allows mocking git in tests.
#[cfg_attr(test, mockall::automock)]
pub trait GitBackend {
    /// Per-file change status listing (`--name-status`).
    fn name_status(&self, target: DiffTarget) -> Result<String, GitError>;

    /// Changed file names only (`--name-only`).
    fn name_only(&self, target: DiffTarget) -> Result<String, GitError>;

    /// Numeric stat block (`--stat`).
    fn stat(&self, target: DiffTarget) -> Result<String, GitError>;

    /// Full unified diff, failing with `OutputTooLarge` past `max_bytes`.
    fn diff(&self, target: DiffTarget, max_bytes: usize) -> Result<String, GitError>;

    /// Current branch name, or `None` on a detached HEAD.
    fn current_branch(&self) -> Result<Option<String>, GitError>;

    fn commit(&self, message: &str) -> Result<(), GitError>;

    /// Replace the message of HEAD without folding in staged content.
    fn amend_message(&self, message: &str) -> Result<(), GitError>;

    fn last_commit_message(&self) -> Result<String, GitError>;

    /// Abbreviated hash of HEAD.
    fn last_commit_hash(&self) -> Result<String, GitError>;
}

/// `GitBackend` backed by the system `git` binary.
pub struct GitCli {
    root: PathBuf,
}

impl GitCli {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(&self.root).args(args);
        cmd
    }

    /// Run a git command and return its stdout or a descriptive error.
    fn run_git(&self, args: &[&str], operation: &str) -> Result<String, GitError> {
        debug!("git {}", args.join(" "));
        let output = self
            .command(args)
            .output()
            .map_err(|source| GitError::SpawnFailed {
                operation: operation.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(GitError::CommandFailed {
                operation: operation.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run a git command, reading at most `limit` bytes of stdout.
    fn run_git_bounded(
        &self,
        args: &[&str],
        operation: &str,
        limit: usize,
    ) -> Result<String, GitError> {
        debug!("git {} (limit {} bytes)", args.join(" "), limit);
        read_bounded(self.command(args), operation, limit)
    }

    fn head_exists(&self) -> bool {
        self.command(&["rev-parse", "--verify", "--quiet", "HEAD"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

/// Run `cmd`, reading at most `limit` bytes of stdout.
///
/// stderr is drained on its own thread so a chatty child cannot block on a
/// full pipe while stdout is still being read.
fn read_bounded(mut cmd: Command, operation: &str, limit: usize) -> Result<String, GitError> {
    let spawn_failed = |source| GitError::SpawnFailed {
        operation: operation.to_string(),
        source,
    };

    let mut child = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(spawn_failed)?;

    let stderr_reader = child.stderr.take().map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            pipe.read_to_end(&mut buf).map(|_| buf)
        })
    });

    let mut stdout = Vec::new();
    if let Some(pipe) = child.stdout.take() {
        if let Err(e) = pipe.take(limit as u64 + 1).read_to_end(&mut stdout) {
            let _ = child.kill();
            let _ = child.wait();
            return Err(spawn_failed(e));
        }
    }

    if stdout.len() > limit {
        let _ = child.kill();
        let _ = child.wait();
        return Err(GitError::OutputTooLarge {
            operation: operation.to_string(),
            limit,
        });
    }

    let status = child.wait().map_err(spawn_failed)?;

    let stderr = match stderr_reader.map(|handle| handle.join()) {
        Some(Ok(result)) => result.map_err(spawn_failed)?,
        Some(Err(_)) => {
            return Err(spawn_failed(std::io::Error::other(
                "stderr reader thread panicked",
            )));
        }
        None => Vec::new(),
    };

    if !status.success() {
        return Err(GitError::CommandFailed {
            operation: operation.to_string(),
            stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&stdout).into_owned())
}

impl GitBackend for GitCli {
    fn name_status(&self, target: DiffTarget) -> Result<String, GitError> {
        self.run_git(&target.args(&["--name-status"]), "diff --name-status")
    }

    fn name_only(&self, target: DiffTarget) -> Result<String, GitError> {
        self.run_git(&target.args(&["--name-only"]), "diff --name-only")
    }

    fn stat(&self, target: DiffTarget) -> Result<String, GitError> {
        self.run_git(&target.args(&["--stat"]), "diff --stat")
    }

    fn diff(&self, target: DiffTarget, max_bytes: usize) -> Result<String, GitError> {
        self.run_git_bounded(&target.args(&[]), "diff", max_bytes)
    }

    fn current_branch(&self) -> Result<Option<String>, GitError> {
        let branch = self.run_git(&["branch", "--show-current"], "branch --show-current")?;
        let branch = branch.trim();
        Ok((!branch.is_empty()).then(|| branch.to_string()))
    }

    fn commit(&self, message: &str) -> Result<(), GitError> {
        self.run_git(&["commit", "-m", message], "commit").map(|_| ())
    }

    fn amend_message(&self, message: &str) -> Result<(), GitError> {
        if !self.head_exists() {
            return Err(GitError::NoCommits);
        }
        self.run_git(&["commit", "--amend", "--only", "-m", message], "commit --amend")
            .map(|_| ())
    }

    fn last_commit_message(&self) -> Result<String, GitError> {
        if !self.head_exists() {
            return Err(GitError::NoCommits);
        }
        let message = self.run_git(&["log", "-1", "--format=%B"], "log")?;
        Ok(message.trim().to_string())
    }

    fn last_commit_hash(&self) -> Result<String, GitError> {
        if !self.head_exists() {
            return Err(GitError::NoCommits);
        }
        let hash = self.run_git(&["rev-parse", "--short", "HEAD"], "rev-parse")?;
        Ok(hash.trim().to_string())
    }
}
