//! Commit pipeline: gather changes, merge notes, generate, prefix, write.
//!
//! One run walks the stages in order and stops at the first failure:
//! changes checked, notes loaded, message generated, prefix applied, then
//! commit, amend, or stop for a dry run. Notes are cleared only after a
//! successful commit or amend that actually used them.

use tracing::{debug, info, warn};

use crate::commit::{
    DiffSummarizer, Prefix, PrefixFormat, build_commit_prompt, format_with_prefix,
    generate_commit_message, resolve_prefix,
};
use crate::error::CommitError;
use crate::git::{DiffTarget, GitBackend};
use crate::llm::LanguageModel;
use crate::notes::NoteStore;

/// What the run writes at the end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Describe the staged changes and create a new commit.
    #[default]
    Commit,
    /// Describe the last commit and replace its message.
    Regenerate,
}

/// Settings for one pipeline run, derived from CLI flags and config.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub mode: Mode,
    pub dry_run: bool,
    pub prefix_override: Option<String>,
    pub auto_prefix: bool,
    pub prefix_format: PrefixFormat,
    pub summarizer: DiffSummarizer,
}

/// The commit being regenerated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviousCommit {
    pub hash: String,
    pub message: String,
}

/// A generated, prefixed message and how it was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    /// Final message including any prefix.
    pub message: String,
    pub prefix: Option<Prefix>,
    pub notes_used: usize,
    /// Whether the model saw a summary instead of the full diff.
    pub summarized: bool,
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Committed(Generated),
    Amended {
        generated: Generated,
        previous: PreviousCommit,
    },
    DryRun {
        generated: Generated,
        previous: Option<PreviousCommit>,
    },
}

impl Outcome {
    pub fn generated(&self) -> &Generated {
        match self {
            Outcome::Committed(generated) => generated,
            Outcome::Amended { generated, .. } => generated,
            Outcome::DryRun { generated, .. } => generated,
        }
    }

    pub fn message(&self) -> &str {
        &self.generated().message
    }
}

/// Run the pipeline once.
pub async fn run_pipeline<G, L>(
    config: &PipelineConfig,
    git: &G,
    llm: &L,
    notes: &NoteStore,
) -> Result<Outcome, CommitError>
where
    G: GitBackend + ?Sized,
    L: LanguageModel + ?Sized,
{
    // Changes
    let (target, previous) = match config.mode {
        Mode::Commit => (DiffTarget::Staged, None),
        Mode::Regenerate => {
            let hash = git.last_commit_hash()?;
            let message = git.last_commit_message()?;
            debug!("Regenerating message for {}", hash);
            (DiffTarget::LastCommit, Some(PreviousCommit { hash, message }))
        }
    };

    let payload = match config.summarizer.summarize(git, target)? {
        Some(payload) => payload,
        None if previous.is_some() => return Err(CommitError::EmptyLastCommit),
        None => return Err(CommitError::NothingStaged),
    };

    // Notes
    let loaded_notes = notes.load();
    debug!("Using {} note(s) as context", loaded_notes.len());

    // Message
    let prompt = build_commit_prompt(&payload, &loaded_notes);
    let message = generate_commit_message(llm, &prompt).await?;

    // Prefix
    let prefix = resolve_prefix(config.prefix_override.as_deref(), config.auto_prefix, git);
    let message = format_with_prefix(&message, prefix.as_ref(), config.prefix_format);

    let generated = Generated {
        message,
        prefix,
        notes_used: loaded_notes.len(),
        summarized: payload.is_summary(),
    };

    if config.dry_run {
        return Ok(Outcome::DryRun {
            generated,
            previous,
        });
    }

    // Write
    let outcome = match previous {
        None => {
            git.commit(&generated.message)
                .map_err(CommitError::CommitFailed)?;
            info!("Committed: {}", generated.message);
            Outcome::Committed(generated)
        }
        Some(previous) => {
            git.amend_message(&generated.message)
                .map_err(CommitError::AmendFailed)?;
            info!("Amended {}: {}", previous.hash, generated.message);
            Outcome::Amended {
                generated,
                previous,
            }
        }
    };

    if outcome.generated().notes_used > 0 {
        // The commit already exists; a stale notes file is only an annoyance.
        if let Err(e) = notes.clear() {
            warn!("Commit succeeded but notes could not be cleared: {e}");
        }
    }

    Ok(outcome)
}
