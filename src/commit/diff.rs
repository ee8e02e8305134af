//! Choosing how much of a change set to show the model.

use tracing::{debug, warn};

use crate::error::GitError;
use crate::git::{DEFAULT_DIFF_BUFFER, DiffTarget, GitBackend};

/// Diffs with at least this many characters are replaced by a summary.
pub const DEFAULT_DIFF_THRESHOLD: usize = 30_000;

/// What the prompt is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffPayload {
    /// The literal unified diff.
    Diff(String),
    /// File list plus stat block, used when the diff is too large or unreadable.
    Summary(String),
}

impl DiffPayload {
    pub fn text(&self) -> &str {
        match self {
            DiffPayload::Diff(text) | DiffPayload::Summary(text) => text,
        }
    }

    pub fn is_summary(&self) -> bool {
        matches!(self, DiffPayload::Summary(_))
    }
}

/// Selects between the full diff and a summary based on size.
#[derive(Debug, Clone)]
pub struct DiffSummarizer {
    threshold: usize,
    buffer_limit: usize,
}

impl Default for DiffSummarizer {
    fn default() -> Self {
        Self::new(DEFAULT_DIFF_THRESHOLD)
    }
}

impl DiffSummarizer {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            buffer_limit: DEFAULT_DIFF_BUFFER,
        }
    }

    /// Override the read buffer used when fetching the full diff.
    pub fn with_buffer_limit(mut self, buffer_limit: usize) -> Self {
        self.buffer_limit = buffer_limit;
        self
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Build the payload for `target`, or `None` when there are no changes.
    ///
    /// Tiers:
    /// 1. Diff under the threshold: the diff itself.
    /// 2. Diff at or over the threshold: file names plus stat block.
    /// 3. Diff could not be read: name-status listing plus stat block.
    pub fn summarize<G: GitBackend + ?Sized>(
        &self,
        git: &G,
        target: DiffTarget,
    ) -> Result<Option<DiffPayload>, GitError> {
        let status = git.name_status(target)?;
        if status.trim().is_empty() {
            return Ok(None);
        }

        let payload = match git.diff(target, self.buffer_limit) {
            Ok(diff) => {
                let size = diff.chars().count();
                if size < self.threshold {
                    DiffPayload::Diff(diff)
                } else {
                    debug!(
                        "Diff is {} chars (threshold {}), sending file summary",
                        size, self.threshold
                    );
                    let files = git.name_only(target)?;
                    let stat = git.stat(target)?;
                    DiffPayload::Summary(format_summary(&files, &stat))
                }
            }
            Err(e) => {
                warn!("Could not read full diff, sending status summary instead: {e}");
                let stat = git.stat(target)?;
                DiffPayload::Summary(format_summary(&status, &stat))
            }
        };

        Ok(Some(payload))
    }
}

fn format_summary(files: &str, stat: &str) -> String {
    format!(
        "Files changed:\n{}\n\nStats:\n{}",
        files.trim_end(),
        stat.trim_end()
    )
}
