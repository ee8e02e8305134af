//! Repository discovery.

use std::path::{Path, PathBuf};

use git2::Repository;
use tracing::debug;

use crate::error::GitError;

/// Location of the enclosing repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoContext {
    /// Absolute path of the working tree root.
    pub root: PathBuf,
    /// Absolute path of the repository metadata directory (usually `<root>/.git`).
    pub git_dir: PathBuf,
}

impl RepoContext {
    pub fn new(root: PathBuf, git_dir: PathBuf) -> Self {
        Self { root, git_dir }
    }

    /// Walk up from `start` to find the enclosing repository.
    ///
    /// Bare repositories are rejected since there is nothing to stage.
    pub fn discover(start: &Path) -> Result<Self, GitError> {
        let repo = Repository::discover(start).map_err(GitError::NotARepository)?;

        let workdir = repo
            .workdir()
            .ok_or_else(|| GitError::BareRepository(repo.path().display().to_string()))?;

        let root = normalize(workdir);
        let git_dir = normalize(repo.path());
        debug!("Discovered repository root={} git_dir={}", root.display(), git_dir.display());

        Ok(Self { root, git_dir })
    }

    /// Identity string stored alongside persisted notes.
    pub fn identity(&self) -> String {
        self.root.display().to_string()
    }
}

/// Verify that the `git` binary is reachable.
pub fn check_git_installed() -> Result<(), GitError> {
    which::which("git").map(|_| ()).map_err(|_| GitError::NotInstalled)
}

/// Canonicalize when possible and drop the trailing separator git2 leaves on paths.
fn normalize(path: &Path) -> PathBuf {
    let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    path.components().collect()
}
