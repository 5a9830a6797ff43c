//! In-memory [`RepositoryBackend`] for tests and for driving the pipeline
//! without a Git checkout.
//!
//! History is scripted with a builder: each [`commit`](InMemoryBackend::commit)
//! records a new revision of one file. Blame is derived by carrying line
//! attribution forward while a line keeps the same text at the same index.
//! The `reference` argument is ignored; the newest commit per file is the
//! reference revision.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Result};

use super::RepositoryBackend;
use crate::models::CommitRecord;

#[derive(Debug, Default)]
struct MemoryFile {
    path: String,
    /// Oldest first.
    commits: Vec<CommitRecord>,
    blobs: HashMap<String, Vec<u8>>,
    fail_blame: bool,
    fail_content: bool,
}

/// Scripted repository held entirely in memory.
#[derive(Debug)]
pub struct InMemoryBackend {
    repository: bool,
    files: Vec<MemoryFile>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            repository: true,
            files: Vec::new(),
        }
    }

    /// Make [`is_repository`](RepositoryBackend::is_repository) report false.
    pub fn not_a_repository(mut self) -> Self {
        self.repository = false;
        self
    }

    /// Track a path without committing it.
    pub fn track(mut self, path: &str) -> Self {
        self.file_mut(path);
        self
    }

    /// Record a commit that sets `path` to `content`.
    pub fn commit(mut self, path: &str, commit: CommitRecord, content: impl Into<Vec<u8>>) -> Self {
        let file = self.file_mut(path);
        file.blobs.insert(commit.id.clone(), content.into());
        file.commits.push(commit);
        self
    }

    /// Make blame fail for `path`.
    pub fn fail_blame(mut self, path: &str) -> Self {
        self.file_mut(path).fail_blame = true;
        self
    }

    /// Make blob retrieval fail for `path`.
    pub fn fail_content(mut self, path: &str) -> Self {
        self.file_mut(path).fail_content = true;
        self
    }

    fn file_mut(&mut self, path: &str) -> &mut MemoryFile {
        let idx = match self.files.iter().position(|f| f.path == path) {
            Some(idx) => idx,
            None => {
                self.files.push(MemoryFile {
                    path: path.to_string(),
                    ..Default::default()
                });
                self.files.len() - 1
            }
        };
        &mut self.files[idx]
    }

    fn file(&self, path: &str) -> Option<&MemoryFile> {
        self.files.iter().find(|f| f.path == path)
    }
}

impl RepositoryBackend for InMemoryBackend {
    fn is_repository(&self, _root: &Path) -> bool {
        self.repository
    }

    fn list_tracked_paths(&self, _root: &Path) -> Result<Vec<String>> {
        Ok(self.files.iter().map(|f| f.path.clone()).collect())
    }

    fn commits_touching(
        &self,
        _root: &Path,
        _reference: &str,
        path: &str,
        limit: Option<usize>,
    ) -> Result<Vec<CommitRecord>> {
        let Some(file) = self.file(path) else {
            return Ok(Vec::new());
        };
        let newest_first = file.commits.iter().rev().cloned();
        Ok(match limit {
            Some(n) => newest_first.take(n).collect(),
            None => newest_first.collect(),
        })
    }

    fn blame_at_reference(
        &self,
        _root: &Path,
        reference: &str,
        path: &str,
    ) -> Result<Vec<(CommitRecord, String)>> {
        let file = match self.file(path) {
            Some(file) if !file.fail_blame && !file.commits.is_empty() => file,
            _ => bail!("no such path '{}' in {}", path, reference),
        };

        let mut previous: Vec<String> = Vec::new();
        let mut owners: Vec<usize> = Vec::new();
        for (idx, commit) in file.commits.iter().enumerate() {
            let text = String::from_utf8_lossy(&file.blobs[&commit.id]).into_owned();
            let lines: Vec<String> = text.lines().map(str::to_string).collect();
            owners = lines
                .iter()
                .enumerate()
                .map(|(n, line)| match previous.get(n) {
                    Some(prev) if prev == line => owners[n],
                    _ => idx,
                })
                .collect();
            previous = lines;
        }

        Ok(previous
            .into_iter()
            .zip(owners)
            .map(|(line, owner)| (file.commits[owner].clone(), line))
            .collect())
    }

    fn blob_at(&self, _root: &Path, commit: &str, path: &str) -> Result<Vec<u8>> {
        let Some(file) = self.file(path) else {
            bail!("path '{}' does not exist in '{}'", path, commit);
        };
        if file.fail_content {
            bail!("could not read blob for '{}' at {}", path, commit);
        }
        match file.blobs.get(commit) {
            Some(bytes) => Ok(bytes.clone()),
            None => bail!("path '{}' does not exist in '{}'", path, commit),
        }
    }
}
