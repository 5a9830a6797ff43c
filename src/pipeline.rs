//! Provenance pipeline orchestration.
//!
//! Drives one end-to-end run: validate the repository, list tracked files,
//! then for each file (sequentially, in listing order) read its history,
//! blame and content, assemble a [`FileDocument`], and hand it to a
//! [`Sink`]. Per-file failures become skips in the [`RunReport`]; only an
//! invalid repository, a failed listing, or a failed finalize end the run.
//! Nothing is retried.

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::PathBuf;

use crate::assemble::assemble;
use crate::backend::RepositoryBackend;
use crate::config::RepositoryConfig;
use crate::error::ProvenanceError;
use crate::models::{FileDocument, RunReport};
use crate::progress::{NoProgress, ProgressEvent, ProgressReporter};
use crate::reader::RepositoryReader;
use crate::sink::Sink;

/// Include/exclude glob filter over tracked paths.
pub struct PathFilter {
    include: Option<GlobSet>,
    exclude: GlobSet,
}

impl PathFilter {
    /// A filter that accepts every path.
    pub fn all() -> Self {
        Self {
            include: None,
            exclude: GlobSet::empty(),
        }
    }

    /// An empty `include` list accepts every path not excluded.
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        let include = if include.is_empty() {
            None
        } else {
            Some(build_globset(include)?)
        };
        Ok(Self {
            include,
            exclude: build_globset(exclude)?,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        if self.exclude.is_match(path) {
            return false;
        }
        self.include.as_ref().map_or(true, |set| set.is_match(path))
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

pub struct Pipeline<B> {
    reader: RepositoryReader<B>,
    filter: PathFilter,
    progress: Box<dyn ProgressReporter>,
}

impl<B: RepositoryBackend> Pipeline<B> {
    pub fn new(reader: RepositoryReader<B>) -> Self {
        Self {
            reader,
            filter: PathFilter::all(),
            progress: Box::new(NoProgress),
        }
    }

    /// Build a pipeline for `root` using the `[repository]` settings.
    pub fn from_config(backend: B, root: impl Into<PathBuf>, config: &RepositoryConfig) -> Result<Self> {
        let reader = RepositoryReader::new(backend, root, config.reference.clone())
            .with_max_history(config.max_history);
        let filter = PathFilter::new(&config.include_globs, &config.exclude_globs)?;
        Ok(Self::new(reader).with_filter(filter))
    }

    pub fn with_filter(mut self, filter: PathFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_progress(mut self, progress: Box<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    pub fn reader(&self) -> &RepositoryReader<B> {
        &self.reader
    }

    /// Run the pipeline into `sink`.
    ///
    /// Fails with [`ProvenanceError::InvalidRepository`] before touching the
    /// sink when the root is not a repository.
    pub fn run(&self, sink: &mut dyn Sink) -> Result<RunReport> {
        self.reader.validate()?;

        self.progress.report(ProgressEvent::Discovering {
            repo: self.reader.root().display().to_string(),
        });
        let files: Vec<String> = self
            .reader
            .list_tracked_files()?
            .into_iter()
            .filter(|path| self.filter.matches(path))
            .collect();
        let total = files.len() as u64;
        tracing::info!(
            repo = %self.reader.root().display(),
            reference = self.reader.reference(),
            files = files.len(),
            "processing tracked files"
        );

        let mut report = RunReport::default();
        for (i, path) in files.iter().enumerate() {
            self.progress.report(ProgressEvent::Processing {
                n: i as u64 + 1,
                total,
                path: path.clone(),
            });

            let outcome = self
                .build_document(path)
                .and_then(|document| sink.accept(document));
            match outcome {
                Ok(()) => {
                    report.indexed += 1;
                    tracing::debug!(path = %path, "indexed");
                }
                Err(e) => {
                    tracing::info!(path = %path, reason = %e, "skipping");
                    report.record_skip(path, e.to_string());
                }
            }
        }

        sink.finalize()?;
        Ok(report)
    }

    fn build_document(&self, path: &str) -> Result<FileDocument, ProvenanceError> {
        let latest = self
            .reader
            .latest_commit(path)?
            .ok_or(ProvenanceError::NoCommitHistory)?;
        let history = self.reader.commit_history(path)?;
        let blame = self.reader.blame(path)?;
        let content = self.reader.content_at(&latest.id, path)?;
        Ok(assemble(path, &latest, history, blame, content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::models::CommitRecord;
    use crate::sink::BufferedJsonSink;
    use chrono::{TimeZone, Utc};

    fn commit(id: &str, secs: i64) -> CommitRecord {
        CommitRecord {
            id: id.to_string(),
            author: "Ada".to_string(),
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
            message: format!("commit {}", id),
        }
    }

    fn pipeline(backend: InMemoryBackend) -> (tempfile::TempDir, Pipeline<InMemoryBackend>) {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(RepositoryReader::new(backend, dir.path(), "HEAD"));
        (dir, pipeline)
    }

    /// Counts sink calls; rejects one path.
    #[derive(Default)]
    struct CountingSink {
        accepted: Vec<String>,
        finalized: usize,
        reject: Option<String>,
    }

    impl Sink for CountingSink {
        fn accept(&mut self, document: FileDocument) -> Result<(), ProvenanceError> {
            if self.reject.as_deref() == Some(document.file_path.as_str()) {
                return Err(ProvenanceError::IndexWriteFailure("rejected".into()));
            }
            self.accepted.push(document.file_path);
            Ok(())
        }

        fn finalize(&mut self) -> Result<()> {
            self.finalized += 1;
            Ok(())
        }
    }

    #[test]
    fn path_filter_include_and_exclude() {
        let filter = PathFilter::new(&["src/**".to_string()], &["**/*.lock".to_string()]).unwrap();
        assert!(filter.matches("src/lib.rs"));
        assert!(!filter.matches("src/Cargo.lock"));
        assert!(!filter.matches("README.md"));
        assert!(PathFilter::all().matches("anything/at/all"));
    }

    #[test]
    fn invalid_repository_aborts_before_sink() {
        let (_dir, pipeline) = pipeline(
            InMemoryBackend::new()
                .commit("a.txt", commit("c1", 1), "a\n")
                .not_a_repository(),
        );
        let mut sink = CountingSink::default();
        let err = pipeline.run(&mut sink).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ProvenanceError>(),
            Some(ProvenanceError::InvalidRepository(_))
        ));
        assert!(sink.accepted.is_empty());
        assert_eq!(sink.finalized, 0);
    }

    #[test]
    fn uncommitted_file_is_skipped_with_reason() {
        let (_dir, pipeline) = pipeline(
            InMemoryBackend::new()
                .commit("a.txt", commit("c1", 1), "a\n")
                .track("new.txt"),
        );
        let mut sink = CountingSink::default();
        let report = pipeline.run(&mut sink).unwrap();

        assert_eq!(report.indexed, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.skipped_paths[0].path, "new.txt");
        assert_eq!(report.skipped_paths[0].reason, "no commit history");
        assert_eq!(sink.accepted, vec!["a.txt"]);
        assert_eq!(sink.finalized, 1);
    }

    #[test]
    fn per_file_failures_do_not_stop_the_run() {
        let (_dir, pipeline) = pipeline(
            InMemoryBackend::new()
                .commit("blame.txt", commit("c1", 1), "x\n")
                .fail_blame("blame.txt")
                .commit("content.txt", commit("c2", 2), "y\n")
                .fail_content("content.txt")
                .commit("rejected.txt", commit("c3", 3), "z\n")
                .commit("ok.txt", commit("c4", 4), "ok\n"),
        );
        let mut sink = CountingSink {
            reject: Some("rejected.txt".into()),
            ..Default::default()
        };
        let report = pipeline.run(&mut sink).unwrap();

        assert_eq!(sink.accepted, vec!["ok.txt"]);
        assert_eq!(report.indexed, 1);
        assert_eq!(report.indexed + report.skipped_paths.len(), 4);
        let reasons: Vec<&str> = report.skipped_paths.iter().map(|s| s.reason.as_str()).collect();
        assert!(reasons[0].starts_with("blame unavailable"));
        assert!(reasons[1].starts_with("content unavailable"));
        assert_eq!(reasons[2], "index write failed: rejected");
    }

    #[test]
    fn filtered_paths_are_not_counted() {
        let (_dir, pipeline) = pipeline(
            InMemoryBackend::new()
                .commit("src/lib.rs", commit("c1", 1), "fn a() {}\n")
                .commit("Cargo.lock", commit("c2", 2), "lock\n"),
        );
        let pipeline =
            pipeline.with_filter(PathFilter::new(&[], &["*.lock".to_string()]).unwrap());
        let mut sink = CountingSink::default();
        let report = pipeline.run(&mut sink).unwrap();

        assert_eq!(report.total(), 1);
        assert_eq!(sink.accepted, vec!["src/lib.rs"]);
    }

    #[test]
    fn documents_follow_listing_order_and_history_invariants() {
        let (_dir, pipeline) = pipeline(
            InMemoryBackend::new()
                .commit("README.md", commit("c1", 100), "# Title\n")
                .commit("b.txt", commit("b1", 150), "b\n")
                .commit("README.md", commit("c2", 200), "# Title\nMore\n"),
        );
        let mut sink = BufferedJsonSink::new(None);
        let report = pipeline.run(&mut sink).unwrap();
        assert_eq!(report.indexed, 2);

        let docs = sink.documents();
        assert_eq!(docs[0].file_path, "README.md");
        assert_eq!(docs[1].file_path, "b.txt");

        let readme = &docs[0];
        assert_eq!(readme.last_commit, "c2");
        let ids: Vec<&str> = readme.commit_history.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c2", "c1"]);
        assert_eq!(readme.commit_history[0].id, readme.last_commit);
        assert_eq!(readme.blame.len(), 2);
        for line in &readme.blame {
            assert!(ids.contains(&line.commit.as_str()));
        }
        assert_eq!(readme.file_content, "# Title\nMore\n");
        assert_eq!(readme.last_modified.timestamp(), 200);
    }

    #[test]
    fn from_config_applies_history_cap_and_globs() {
        let dir = tempfile::tempdir().unwrap();
        let config = RepositoryConfig {
            include_globs: vec!["*.md".to_string()],
            max_history: Some(1),
            ..Default::default()
        };
        let backend = InMemoryBackend::new()
            .commit("a.md", commit("c1", 1), "1\n")
            .commit("a.md", commit("c2", 2), "2\n")
            .commit("b.txt", commit("c3", 3), "3\n");
        let pipeline = Pipeline::from_config(backend, dir.path(), &config).unwrap();

        let mut sink = BufferedJsonSink::new(None);
        let report = pipeline.run(&mut sink).unwrap();
        assert_eq!(report.total(), 1);
        assert_eq!(sink.documents()[0].commit_history.len(), 1);
        assert_eq!(sink.documents()[0].last_commit, "c2");
    }
}
