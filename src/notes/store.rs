//! Per-repository notes persisted under the git metadata directory.
//!
//! The file is a single JSON document rewritten in full on every change.
//! Concurrent writers are not coordinated: the last writer wins.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::NotesError;
use crate::git::RepoContext;

/// File name of the notes document inside the git directory.
pub const NOTES_FILE_NAME: &str = "scribe-notes.json";

/// A single developer-supplied note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// On-disk representation of the notes file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoteCollection {
    pub notes: Vec<Note>,
    /// Working tree root the notes were written for.
    pub repository: String,
}

/// Notes store bound to one repository.
pub struct NoteStore {
    path: PathBuf,
    repository: String,
}

impl NoteStore {
    pub fn new(path: impl Into<PathBuf>, repository: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            repository: repository.into(),
        }
    }

    /// Store located at `<git_dir>/scribe-notes.json` for the given repository.
    pub fn for_repo(ctx: &RepoContext) -> Self {
        Self::new(ctx.git_dir.join(NOTES_FILE_NAME), ctx.identity())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the notes for this repository.
    ///
    /// Never fails: a missing file, unreadable JSON, or a file written for a
    /// different repository all yield an empty list. A foreign file is left
    /// in place.
    pub fn load(&self) -> Vec<Note> {
        match self.read_collection() {
            Ok(Some(collection)) if collection.repository == self.repository => collection.notes,
            Ok(Some(collection)) => {
                debug!(
                    "Ignoring notes written for {} (current repository is {})",
                    collection.repository, self.repository
                );
                Vec::new()
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Ignoring notes file {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }

    /// Read-only view of the current notes, for display.
    pub fn list(&self) -> Vec<Note> {
        self.load()
    }

    /// Append a note stamped with the current time and rewrite the file.
    pub fn add(&self, message: &str) -> Result<Note, NotesError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(NotesError::EmptyMessage);
        }

        let note = Note {
            message: message.to_string(),
            timestamp: Utc::now(),
        };

        let mut notes = self.load();
        notes.push(note.clone());

        self.write_collection(&NoteCollection {
            notes,
            repository: self.repository.clone(),
        })?;

        debug!("Added note to {}", self.path.display());
        Ok(note)
    }

    /// Delete the notes file. Returns whether a file was removed.
    pub fn clear(&self) -> Result<bool, NotesError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Cleared notes at {}", self.path.display());
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(NotesError::WriteFailed(e)),
        }
    }

    fn read_collection(&self) -> Result<Option<NoteCollection>, NotesError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(NotesError::ReadFailed(e)),
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(NotesError::ParseFailed)
    }

    /// Write via a temp file in the same directory and rename into place.
    fn write_collection(&self, collection: &NoteCollection) -> Result<(), NotesError> {
        let data =
            serde_json::to_string_pretty(collection).map_err(NotesError::SerializeFailed)?;

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = NamedTempFile::new_in(dir).map_err(NotesError::WriteFailed)?;
        tmp.write_all(data.as_bytes())
            .map_err(NotesError::WriteFailed)?;
        tmp.write_all(b"\n").map_err(NotesError::WriteFailed)?;
        tmp.persist(&self.path)
            .map_err(|e| NotesError::WriteFailed(e.error))?;

        Ok(())
    }
}
