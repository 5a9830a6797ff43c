//! Error taxonomy for a provenance run.
//!
//! Only [`ProvenanceError::InvalidRepository`] ends a run. Every other
//! variant is caught at the pipeline's per-file boundary and recorded as a
//! skip; its `Display` text becomes the skip reason.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProvenanceError {
    /// Root is not a directory or has no `.git` metadata.
    #[error("'{}' is not a valid Git repository", .0.display())]
    InvalidRepository(PathBuf),

    #[error("no commit history")]
    NoCommitHistory,

    /// The history query itself failed (as opposed to returning nothing).
    #[error("commit history unavailable: {0}")]
    HistoryUnavailable(String),

    #[error("blame unavailable: {0}")]
    BlameUnavailable(String),

    #[error("content unavailable: {0}")]
    ContentUnavailable(String),

    #[error("index write failed: {0}")]
    IndexWriteFailure(String),
}

impl ProvenanceError {
    /// Whether this error aborts the whole run rather than a single file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProvenanceError::InvalidRepository(_))
    }
}

/// First non-empty line of an error chain, for use in skip reasons.
pub(crate) fn summarize(err: &anyhow::Error) -> String {
    let text = format!("{:#}", err);
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("unknown error")
        .to_string()
}
