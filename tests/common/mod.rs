//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use git2::{Oid, Repository, Signature};
use scribe::git::RepoContext;
use serde_json::{Value, json};

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository in a temp directory.
    ///
    /// Identity and signing are configured locally so the `git` binary can
    /// commit regardless of the machine's global config.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        {
            let mut config = repo.config().expect("Failed to open repo config");
            config
                .set_str("user.name", "Test User")
                .expect("Failed to set user.name");
            config
                .set_str("user.email", "test@example.com")
                .expect("Failed to set user.email");
            config
                .set_bool("commit.gpgsign", false)
                .expect("Failed to disable signing");
        }
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn context(&self) -> RepoContext {
        RepoContext::discover(self.path()).expect("Failed to discover test repo")
    }

    /// Path of the notes file scribe uses for this repository.
    pub fn notes_path(&self) -> PathBuf {
        self.context().git_dir.join(scribe::notes::NOTES_FILE_NAME)
    }

    /// Write `contents` to `name` in the working tree.
    pub fn write_file(&self, name: &str, contents: &str) {
        let path = self.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(path, contents).expect("Failed to write test file");
    }

    /// Write and stage a file.
    pub fn stage_file(&self, name: &str, contents: &str) {
        self.write_file(name, contents);
        let mut index = self.repo.index().expect("Failed to get index");
        index.add_path(Path::new(name)).expect("Failed to add file");
        index.write().expect("Failed to write index");
    }

    /// Commit whatever is staged. Returns the commit OID.
    pub fn commit(&self, message: &str) -> Oid {
        let sig = Signature::now("Test User", "test@example.com").expect("Failed to create signature");
        let mut index = self.repo.index().expect("Failed to get index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Point HEAD at `refs/heads/<name>`; works before the first commit too.
    pub fn switch_branch(&self, name: &str) {
        self.repo
            .set_head(&format!("refs/heads/{name}"))
            .expect("Failed to switch branch");
    }

    /// Message of the HEAD commit, or `None` before the first commit.
    pub fn head_message(&self) -> Option<String> {
        let head = self.repo.head().ok()?;
        let commit = head.peel_to_commit().ok()?;
        commit.message().map(|m| m.trim_end().to_string())
    }

    pub fn commit_count(&self) -> usize {
        let Ok(mut walk) = self.repo.revwalk() else {
            return 0;
        };
        if walk.push_head().is_err() {
            return 0;
        }
        walk.count()
    }
}

/// A successful `generateContent` response carrying `text`.
pub fn gemini_reply(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{ "text": text }]
            },
            "finishReason": "STOP"
        }]
    })
}

/// Request path for a model on the mock server.
pub fn generate_path(model: &str) -> String {
    format!("/v1beta/models/{model}:generateContent")
}
