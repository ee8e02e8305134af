//! scribe - A CLI tool that writes conventional commit messages with an LLM.
//!
//! # Overview
//!
//! scribe reads the staged diff (or a summary of it when it is large), merges
//! it with free-text notes the developer saved for this repository, asks a
//! Gemini model for a single-line conventional commit message, applies an
//! optional ticket prefix, and commits. It can also regenerate and amend the
//! message of the last commit.

pub mod commit;
pub mod config;
pub mod error;
pub mod git;
pub mod llm;
pub mod notes;
pub mod pipeline;

// Re-export commonly used types
pub use commit::{DiffPayload, Prefix, PrefixFormat};
pub use config::{AppConfig, CliOverrides};
pub use error::{CommitError, ConfigError, GenerationError, GitError, NotesError};
pub use git::{GitBackend, GitCli, RepoContext};
pub use llm::{GeminiClient, LanguageModel};
pub use notes::{Note, NoteStore};
pub use pipeline::{Mode, Outcome, PipelineConfig, run_pipeline};
