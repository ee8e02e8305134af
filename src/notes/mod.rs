//! Developer notes attached to the next generated commit message.

pub mod store;

pub use store::{NOTES_FILE_NAME, Note, NoteCollection, NoteStore};
