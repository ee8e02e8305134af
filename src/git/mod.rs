//! Git access: repository discovery via git2, everything else via the `git` binary.

pub mod cli;
pub mod repo;

pub use cli::{DEFAULT_DIFF_BUFFER, DiffTarget, GitBackend, GitCli};
pub use repo::{RepoContext, check_git_installed};
