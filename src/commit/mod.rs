//! AI-generated commit messages: diff selection, prompt, model output and prefixes.

pub mod diff;
pub mod message;
pub mod prefix;
pub mod prompt;

pub use diff::{DEFAULT_DIFF_THRESHOLD, DiffPayload, DiffSummarizer};
pub use message::{generate_commit_message, normalize_message};
pub use prefix::{
    Prefix, PrefixFormat, PrefixSource, format_with_prefix, is_valid_prefix, prefix_from_branch,
    resolve_prefix,
};
pub use prompt::build_commit_prompt;
