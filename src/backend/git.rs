use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::process::Command;

use super::RepositoryBackend;
use crate::models::CommitRecord;

/// `%x1f` separates fields, `%x1e` terminates a record. Messages (`%B`) may
/// contain newlines and pipes, so neither can be used as a delimiter.
const LOG_FORMAT: &str = "--format=%H%x1f%an%x1f%ct%x1f%B%x1e";

/// Backend that drives the `git` executable found on `PATH`.
///
/// Every query is a separate blocking `git` invocation run with the
/// repository root as its working directory.
#[derive(Debug, Clone, Default)]
pub struct GitCli;

impl GitCli {
    pub fn new() -> Self {
        Self
    }
}

impl RepositoryBackend for GitCli {
    fn is_repository(&self, root: &Path) -> bool {
        // `.git` is a file for worktrees and submodules, so only existence matters.
        root.is_dir() && root.join(".git").exists()
    }

    fn list_tracked_paths(&self, root: &Path) -> Result<Vec<String>> {
        let output = run_git(root, &["ls-files", "-z"])?;
        Ok(output
            .split(|b| *b == 0)
            .filter(|entry| !entry.is_empty())
            .map(|entry| String::from_utf8_lossy(entry).into_owned())
            .collect())
    }

    fn commits_touching(
        &self,
        root: &Path,
        reference: &str,
        path: &str,
        limit: Option<usize>,
    ) -> Result<Vec<CommitRecord>> {
        let mut args = vec!["log".to_string(), LOG_FORMAT.to_string()];
        if let Some(n) = limit {
            args.push(format!("--max-count={}", n));
        }
        args.extend([reference.to_string(), "--".to_string(), path.to_string()]);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        match run_git(root, &args) {
            Ok(output) => parse_log(&String::from_utf8_lossy(&output)),
            // An unborn branch has no history for any path.
            Err(_) if !reference_resolves(root, reference) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    fn blame_at_reference(
        &self,
        root: &Path,
        reference: &str,
        path: &str,
    ) -> Result<Vec<(CommitRecord, String)>> {
        let output = run_git(root, &["blame", "--line-porcelain", reference, "--", path])?;
        parse_line_porcelain(&String::from_utf8_lossy(&output))
    }

    fn blob_at(&self, root: &Path, commit: &str, path: &str) -> Result<Vec<u8>> {
        let spec = format!("{}:{}", commit, path);
        run_git(root, &["cat-file", "blob", &spec])
    }
}

fn run_git(root: &Path, args: &[&str]) -> Result<Vec<u8>> {
    // Tracked paths are names, never globs or `:(magic)` pathspecs.
    let output = Command::new("git")
        .arg("--literal-pathspecs")
        .args(args)
        .current_dir(root)
        .output()
        .with_context(|| "Failed to execute 'git'. Is git installed?")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("git {} failed: {}", args[0], stderr.trim());
    }

    Ok(output.stdout)
}

fn reference_resolves(root: &Path, reference: &str) -> bool {
    let spec = format!("{}^{{commit}}", reference);
    run_git(root, &["rev-parse", "--verify", "--quiet", &spec]).is_ok()
}

fn parse_timestamp(secs: &str) -> Result<DateTime<Utc>> {
    let secs: i64 = secs
        .trim()
        .parse()
        .with_context(|| format!("invalid commit timestamp '{}'", secs))?;
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| anyhow::anyhow!("commit timestamp out of range: {}", secs))
}

fn parse_log(output: &str) -> Result<Vec<CommitRecord>> {
    let mut commits = Vec::new();
    for record in output.split('\x1e') {
        let record = record.trim_start_matches(['\n', '\r']);
        if record.is_empty() {
            continue;
        }
        let fields: Vec<&str> = record.splitn(4, '\x1f').collect();
        if fields.len() != 4 {
            bail!("malformed git log record: {:?}", record);
        }
        commits.push(CommitRecord {
            id: fields[0].to_string(),
            author: fields[1].to_string(),
            timestamp: parse_timestamp(fields[2])?,
            message: fields[3].to_string(),
        });
    }
    Ok(commits)
}

fn is_object_id(token: &str) -> bool {
    (token.len() == 40 || token.len() == 64) && token.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Parse `git blame --line-porcelain` output.
///
/// Unlike plain porcelain, line-porcelain repeats the full commit header
/// before every line:
/// ```text
/// <hash> <orig-line> <final-line> [<group-lines>]
/// author <name>
/// ...
/// committer-time <unix-timestamp>
/// summary <subject>
/// filename <path>
/// \t<line-content>
/// ```
fn parse_line_porcelain(output: &str) -> Result<Vec<(CommitRecord, String)>> {
    let mut lines = Vec::new();
    let mut id = String::new();
    let mut author = String::new();
    let mut timestamp: Option<DateTime<Utc>> = None;
    let mut summary = String::new();

    for line in output.split('\n') {
        if let Some(content) = line.strip_prefix('\t') {
            let timestamp = timestamp
                .ok_or_else(|| anyhow::anyhow!("blame entry for {} has no committer-time", id))?;
            lines.push((
                CommitRecord {
                    id: id.clone(),
                    author: author.clone(),
                    timestamp,
                    message: summary.clone(),
                },
                content.to_string(),
            ));
        } else if let Some(val) = line.strip_prefix("author ") {
            author = val.to_string();
        } else if let Some(val) = line.strip_prefix("committer-time ") {
            timestamp = Some(parse_timestamp(val)?);
        } else if let Some(val) = line.strip_prefix("summary ") {
            summary = val.to_string();
        } else {
            let mut tokens = line.split_whitespace();
            if let (Some(first), Some(_), Some(_)) = (tokens.next(), tokens.next(), tokens.next()) {
                if is_object_id(first) {
                    id = first.to_string();
                    timestamp = None;
                }
            }
        }
    }

    Ok(lines)
}
