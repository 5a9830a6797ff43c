//! Library-level tests: the pipeline over real Git repositories and over
//! custom sinks, without going through the CLI.

use anyhow::Result;
use git_provenance::backend::{GitCli, InMemoryBackend};
use git_provenance::error::ProvenanceError;
use git_provenance::models::{CommitRecord, FileDocument};
use git_provenance::pipeline::Pipeline;
use git_provenance::reader::RepositoryReader;
use git_provenance::sink::{BufferedJsonSink, Sink};
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn git(repo: &Path, author: &str, args: &[&str], epoch: i64) {
    let date = format!("@{} +0000", epoch);
    let output = Command::new("git")
        .args(["-c", "commit.gpgsign=false"])
        .args(args)
        .current_dir(repo)
        .env("GIT_AUTHOR_NAME", author)
        .env("GIT_AUTHOR_EMAIL", "dev@example.com")
        .env("GIT_COMMITTER_NAME", author)
        .env("GIT_COMMITTER_EMAIL", "dev@example.com")
        .env("GIT_AUTHOR_DATE", &date)
        .env("GIT_COMMITTER_DATE", &date)
        .output()
        .unwrap();
    assert!(output.status.success(), "git {:?}: {:?}", args, output);
}

fn write_and_commit(repo: &Path, author: &str, path: &str, content: &str, epoch: i64) {
    let full = repo.join(path);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(full, content).unwrap();
    git(repo, author, &["add", path], epoch);
    git(repo, author, &["commit", "-q", "-m", &format!("update {}", path)], epoch);
}

/// A repository where two authors interleave edits across three files.
fn multi_author_repo() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let repo = tmp.path();
    git(repo, "Ann", &["init", "-q"], 0);

    write_and_commit(repo, "Ann", "src/lib.rs", "mod a;\nmod b;\n", 1_700_000_000);
    write_and_commit(repo, "Bob", "README.md", "# Demo\n", 1_700_000_100);
    write_and_commit(repo, "Bob", "src/lib.rs", "mod a;\nmod b;\nmod c;\n", 1_700_000_200);
    write_and_commit(repo, "Ann", "src/lib.rs", "// crate root\nmod a;\nmod b;\nmod c;\n", 1_700_000_300);
    write_and_commit(repo, "Ann", "docs/notes.txt", "one\ntwo\nthree\n", 1_700_000_400);
    tmp
}

fn git_log_count(repo: &Path, path: &str) -> usize {
    let output = Command::new("git")
        .args(["rev-list", "--count", "HEAD", "--", path])
        .current_dir(repo)
        .output()
        .unwrap();
    String::from_utf8_lossy(&output.stdout).trim().parse().unwrap()
}

#[test]
fn git_backed_documents_satisfy_history_and_blame_invariants() {
    let repo = multi_author_repo();
    let pipeline = Pipeline::new(RepositoryReader::new(GitCli::new(), repo.path(), "HEAD"));
    let mut sink = BufferedJsonSink::new(None);

    let report = pipeline.run(&mut sink).unwrap();
    assert_eq!(report.indexed, 3);
    assert_eq!(report.skipped, 0);

    for doc in sink.documents() {
        assert_eq!(doc.commit_history.len(), git_log_count(repo.path(), &doc.file_path));
        assert_eq!(doc.commit_history[0].id, doc.last_commit);
        assert_eq!(doc.blame.len(), doc.file_content.lines().count());

        let ids: Vec<&str> = doc.commit_history.iter().map(|c| c.id.as_str()).collect();
        for line in &doc.blame {
            assert!(ids.contains(&line.commit.as_str()), "{} not in history", line.commit);
        }
    }

    let lib = sink
        .documents()
        .iter()
        .find(|d| d.file_path == "src/lib.rs")
        .unwrap();
    assert_eq!(lib.last_author, "Ann");
    assert_eq!(lib.commit_history.len(), 3);
    let blame_authors: Vec<&str> = lib.blame.iter().map(|b| b.author.as_str()).collect();
    assert_eq!(blame_authors, vec!["Ann", "Ann", "Ann", "Bob"]);
}

#[test]
fn capped_history_keeps_full_blame() {
    let repo = multi_author_repo();
    let reader = RepositoryReader::new(GitCli::new(), repo.path(), "HEAD").with_max_history(Some(1));
    let pipeline = Pipeline::new(reader);
    let mut sink = BufferedJsonSink::new(None);
    pipeline.run(&mut sink).unwrap();

    let lib = sink
        .documents()
        .iter()
        .find(|d| d.file_path == "src/lib.rs")
        .unwrap();
    assert_eq!(lib.commit_history.len(), 1);
    assert!(git_log_count(repo.path(), "src/lib.rs") > lib.commit_history.len());
    assert_eq!(lib.commit_history[0].id, lib.last_commit);
    assert_eq!(lib.blame.len(), 4);
    // Lines older than the cap name commits outside the kept history.
    assert!(lib.blame.iter().any(|b| b.commit != lib.last_commit));
}

#[test]
fn git_backed_runs_render_identically() {
    let repo = multi_author_repo();
    let render = || {
        let pipeline = Pipeline::new(RepositoryReader::new(GitCli::new(), repo.path(), "HEAD"));
        let mut sink = BufferedJsonSink::new(None);
        pipeline.run(&mut sink).unwrap();
        sink.render().unwrap()
    };
    assert_eq!(render(), render());
}

#[test]
fn blame_uses_reference_revision() {
    let repo = multi_author_repo();
    // Pin the reference to the commit before the last edit of src/lib.rs.
    let pipeline = Pipeline::new(RepositoryReader::new(GitCli::new(), repo.path(), "HEAD~2"));
    let mut sink = BufferedJsonSink::new(None);
    pipeline.run(&mut sink).unwrap();

    let lib = sink
        .documents()
        .iter()
        .find(|d| d.file_path == "src/lib.rs")
        .unwrap();
    assert_eq!(lib.blame.len(), 3);
    assert_eq!(lib.blame[0].line, "mod a;");
    assert_eq!(lib.last_author, "Bob");
}

#[test]
fn file_missing_at_reference_is_skipped() {
    let repo = multi_author_repo();
    // docs/notes.txt only exists in the last commit.
    let pipeline = Pipeline::new(RepositoryReader::new(GitCli::new(), repo.path(), "HEAD~1"));
    let mut sink = BufferedJsonSink::new(None);
    let report = pipeline.run(&mut sink).unwrap();

    assert_eq!(report.indexed, 2);
    assert_eq!(report.skipped_paths.len(), 1);
    assert_eq!(report.skipped_paths[0].path, "docs/notes.txt");
    assert_eq!(report.skipped_paths[0].reason, "no commit history");
}

// ─── Custom sink ────────────────────────────────────────────────────

/// A sink that keeps only paths and fails on finalize.
#[derive(Default)]
struct BrokenFinalizeSink {
    paths: Vec<String>,
}

impl Sink for BrokenFinalizeSink {
    fn accept(&mut self, document: FileDocument) -> Result<(), ProvenanceError> {
        self.paths.push(document.file_path);
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        anyhow::bail!("disk full")
    }
}

#[test]
fn finalize_failure_is_fatal() {
    let backend = InMemoryBackend::new().commit(
        "a.txt",
        CommitRecord {
            id: "c1".into(),
            author: "Ann".into(),
            timestamp: chrono::DateTime::from_timestamp(1, 0).unwrap(),
            message: "init".into(),
        },
        "a\n",
    );
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(RepositoryReader::new(backend, dir.path(), "HEAD"));
    let mut sink = BrokenFinalizeSink::default();

    let err = pipeline.run(&mut sink).unwrap_err();
    assert!(err.to_string().contains("disk full"));
    assert_eq!(sink.paths, vec!["a.txt"]);
}
