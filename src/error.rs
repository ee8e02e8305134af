//! Error types for scribe modules using thiserror.

use thiserror::Error;

/// Errors from git discovery and git subprocess calls.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("git was not found in PATH. Install git and try again.")]
    NotInstalled,

    #[error("Not a git repository (or any parent directory): {0}")]
    NotARepository(#[source] git2::Error),

    #[error("Repository at {0} has no working tree (bare repositories are not supported)")]
    BareRepository(String),

    #[error("Failed to run git {operation}: {source}")]
    SpawnFailed {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git {operation} failed: {stderr}")]
    CommandFailed { operation: String, stderr: String },

    #[error("git {operation} produced more than {limit} bytes of output")]
    OutputTooLarge { operation: String, limit: usize },

    #[error("The repository has no commits yet")]
    NoCommits,
}

/// Errors from the notes store.
///
/// Only `EmptyMessage` reaches the user as a failure; read-side problems are
/// recovered inside the store and logged.
#[derive(Error, Debug)]
pub enum NotesError {
    #[error("Note message cannot be empty")]
    EmptyMessage,

    #[error("Failed to read notes file: {0}")]
    ReadFailed(#[source] std::io::Error),

    #[error("Notes file is not valid JSON: {0}")]
    ParseFailed(#[source] serde_json::Error),

    #[error("Failed to write notes file: {0}")]
    WriteFailed(#[source] std::io::Error),

    #[error("Failed to serialize notes: {0}")]
    SerializeFailed(#[source] serde_json::Error),
}

/// Errors from configuration loading and writing.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "No API key configured. Set SCRIBE_API_KEY, pass --api-key, or run 'scribe --init-config'"
    )]
    MissingApiKey,

    #[error("Could not determine a configuration directory for this platform")]
    NoConfigDirectory,

    #[error("Failed to read config file {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Config file {path} is malformed: {message}")]
    Malformed { path: String, message: String },

    #[error("Failed to write config file {path}: {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid prefix format '{0}' (expected \"brackets\" or \"colon\")")]
    InvalidPrefixFormat(String),

    #[error("Configuration cancelled")]
    Cancelled,
}

/// Errors from the language model call.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Request to the model API failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Model API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Model API returned an unexpected response: {0}")]
    InvalidResponse(String),

    #[error("Model returned an empty commit message")]
    EmptyResponse,
}

/// Errors from the commit message pipeline.
#[derive(Error, Debug)]
pub enum CommitError {
    #[error("No changes to commit (nothing staged). Stage files with 'git add' first.")]
    NothingStaged,

    #[error("The last commit has no changes to describe")]
    EmptyLastCommit,

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("Failed to create commit: {0}")]
    CommitFailed(#[source] GitError),

    #[error("Failed to amend commit: {0}")]
    AmendFailed(#[source] GitError),
}
