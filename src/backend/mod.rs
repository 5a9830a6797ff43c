//! Version-control backend abstraction.
//!
//! The [`RepositoryBackend`] trait is the query contract the reader needs:
//! tracked-path enumeration, per-path commit traversal, blame at a
//! reference, and blob retrieval. Implementations:
//!
//! | Backend | Purpose |
//! |---------|---------|
//! | [`GitCli`] | Shells out to the `git` executable |
//! | [`InMemoryBackend`] | Scripted repository for tests and embedding |
//!
//! Backends return raw facts (untrimmed messages and lines). Mapping
//! failures to skip reasons happens in [`crate::reader`].

pub mod git;
pub mod memory;

use std::path::Path;

use anyhow::Result;

use crate::models::CommitRecord;

pub use git::GitCli;
pub use memory::InMemoryBackend;

pub trait RepositoryBackend {
    /// Whether `root` is a directory holding repository metadata.
    fn is_repository(&self, root: &Path) -> bool;

    /// Every path in the backend's index, in backend-native order.
    fn list_tracked_paths(&self, root: &Path) -> Result<Vec<String>>;

    /// Commits reachable from `reference` that touch `path`, newest first.
    ///
    /// Returns an empty list (not an error) when nothing touches the path.
    fn commits_touching(
        &self,
        root: &Path,
        reference: &str,
        path: &str,
        limit: Option<usize>,
    ) -> Result<Vec<CommitRecord>>;

    /// Line attribution of `path` at `reference`, one entry per line in
    /// file order.
    fn blame_at_reference(
        &self,
        root: &Path,
        reference: &str,
        path: &str,
    ) -> Result<Vec<(CommitRecord, String)>>;

    /// Raw bytes of `path` as of `commit`.
    fn blob_at(&self, root: &Path, commit: &str, path: &str) -> Result<Vec<u8>>;
}
