//! Core data models that flow through a provenance run.
//!
//! The serialized shape of [`FileDocument`] is the external contract shared
//! by the JSON output and the search index, so field names here are fixed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One commit as read from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    #[serde(rename = "commit")]
    pub id: String,
    pub author: String,
    #[serde(rename = "date")]
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// Attribution of one physical line at the reference revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlameLine {
    pub commit: String,
    pub author: String,
    pub date: DateTime<Utc>,
    pub line: String,
}

/// The document published for one tracked file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDocument {
    pub file_path: String,
    pub last_modified: DateTime<Utc>,
    pub last_commit: String,
    pub last_commit_message: String,
    pub last_author: String,
    pub commit_history: Vec<CommitRecord>,
    pub blame: Vec<BlameLine>,
    pub file_content: String,
}

/// A file that produced no document, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// Outcome counts for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub indexed: usize,
    pub skipped: usize,
    pub skipped_paths: Vec<SkippedFile>,
}

impl RunReport {
    pub fn record_skip(&mut self, path: &str, reason: impl Into<String>) {
        self.skipped += 1;
        self.skipped_paths.push(SkippedFile {
            path: path.to_string(),
            reason: reason.into(),
        });
    }

    /// Total number of files the run looked at.
    pub fn total(&self) -> usize {
        self.indexed + self.skipped
    }
}
