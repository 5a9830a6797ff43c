//! Repository reader.
//!
//! Binds a [`RepositoryBackend`] to one repository root and reference
//! revision and turns raw backend answers into the per-file facts the
//! pipeline needs. Backend failures are mapped onto [`ProvenanceError`]
//! variants here so skip reasons stay backend-agnostic.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::backend::RepositoryBackend;
use crate::error::{summarize, ProvenanceError};
use crate::models::{BlameLine, CommitRecord};

pub struct RepositoryReader<B> {
    backend: B,
    root: PathBuf,
    reference: String,
    max_history: Option<usize>,
}

impl<B: RepositoryBackend> RepositoryReader<B> {
    pub fn new(backend: B, root: impl Into<PathBuf>, reference: impl Into<String>) -> Self {
        Self {
            backend,
            root: root.into(),
            reference: reference.into(),
            max_history: None,
        }
    }

    /// Cap the length of [`commit_history`](Self::commit_history).
    pub fn with_max_history(mut self, max_history: Option<usize>) -> Self {
        self.max_history = max_history;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn validate(&self) -> Result<(), ProvenanceError> {
        if self.root.is_dir() && self.backend.is_repository(&self.root) {
            Ok(())
        } else {
            Err(ProvenanceError::InvalidRepository(self.root.clone()))
        }
    }

    pub fn list_tracked_files(&self) -> Result<Vec<String>> {
        self.backend
            .list_tracked_paths(&self.root)
            .with_context(|| format!("Failed to list tracked files in {}", self.root.display()))
    }

    /// Most recent commit touching `path`, or `None` when nothing does.
    pub fn latest_commit(&self, path: &str) -> Result<Option<CommitRecord>, ProvenanceError> {
        Ok(self.query_history(path, Some(1))?.into_iter().next())
    }

    pub fn commit_history(&self, path: &str) -> Result<Vec<CommitRecord>, ProvenanceError> {
        self.query_history(path, self.max_history)
    }

    pub fn blame(&self, path: &str) -> Result<Vec<BlameLine>, ProvenanceError> {
        let lines = self
            .backend
            .blame_at_reference(&self.root, &self.reference, path)
            .map_err(|e| ProvenanceError::BlameUnavailable(summarize(&e)))?;

        Ok(lines
            .into_iter()
            .map(|(commit, text)| BlameLine {
                commit: commit.id,
                author: commit.author,
                date: commit.timestamp,
                line: text.trim().to_string(),
            })
            .collect())
    }

    pub fn content_at(&self, commit: &str, path: &str) -> Result<String, ProvenanceError> {
        let bytes = self
            .backend
            .blob_at(&self.root, commit, path)
            .map_err(|e| ProvenanceError::ContentUnavailable(summarize(&e)))?;

        String::from_utf8(bytes).map_err(|_| {
            ProvenanceError::ContentUnavailable("content is not valid UTF-8 (binary file?)".into())
        })
    }

    fn query_history(
        &self,
        path: &str,
        limit: Option<usize>,
    ) -> Result<Vec<CommitRecord>, ProvenanceError> {
        let commits = self
            .backend
            .commits_touching(&self.root, &self.reference, path, limit)
            .map_err(|e| ProvenanceError::HistoryUnavailable(summarize(&e)))?;

        Ok(commits
            .into_iter()
            .map(|c| CommitRecord {
                message: c.message.trim().to_string(),
                ..c
            })
            .collect())
    }
}
