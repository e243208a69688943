use std::path::PathBuf;
use thiserror::Error;

/// Fatal conditions that abort a merge before any output is produced.
///
/// Per-entry failures (an unreadable directory, a file that is not text) are
/// not errors; they are reported through [`crate::MergeIssue`] instead.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum MergeError {
    #[error("No workspace root is available; open a folder or pass --root")]
    NoWorkspace,

    #[error("Select at least {required} files or folders to merge (got {given})")]
    TooFewSelections { required: usize, given: usize },

    #[error("No output destination was chosen")]
    NoOutputDestination,

    #[error("Failed to write merged document to '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy merged document to the clipboard: {0}")]
    Clipboard(String),

    #[error("Filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

pub type MergeResult<T> = std::result::Result<T, MergeError>;
