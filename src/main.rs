//! # gitprov
//!
//! Command-line front end for git-provenance.
//!
//! ## Usage
//!
//! ```bash
//! gitprov [--config gitprov.toml] <REPO> [--json [--output FILE]]
//! gitprov --health
//! ```
//!
//! Without `--json`, every document is upserted into the configured index
//! (`[index]` in the config, `http://localhost:9200` / `git-metadata` by
//! default). With `--json`, one JSON array is written to stdout or to
//! `--output`. A run summary always goes to stderr.
//!
//! Exits non-zero, without producing output, when `REPO` is not a Git
//! repository. Per-file skips never change the exit status.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use git_provenance::backend::GitCli;
use git_provenance::config::{load_config, Config};
use git_provenance::logging::init_logging;
use git_provenance::models::RunReport;
use git_provenance::pipeline::Pipeline;
use git_provenance::progress::ProgressMode;
use git_provenance::sink::{BufferedJsonSink, ElasticsearchClient, IndexSink, Sink};

/// Extract per-file Git provenance and publish it to a search index.
#[derive(Parser)]
#[command(
    name = "gitprov",
    version,
    about = "Extract per-file Git provenance (history, blame, content) and publish it to a search index",
    long_about = "Reads every tracked file of a Git repository, collects its latest commit, full \
    commit history, line blame and committed content, and upserts one document per file into an \
    Elasticsearch-compatible index keyed by file path. With --json, the documents are emitted as \
    a single JSON array instead."
)]
struct Cli {
    /// Path to the Git repository (must contain `.git`).
    #[arg(required_unless_present = "health")]
    repo: Option<PathBuf>,

    /// Emit one JSON array instead of writing to the index.
    #[arg(long)]
    json: bool,

    /// Write the JSON array to this file instead of stdout.
    #[arg(long, requires = "json")]
    output: Option<PathBuf>,

    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Progress on stderr. Defaults to `human` on a terminal, `off` otherwise.
    #[arg(long, value_enum)]
    progress: Option<ProgressMode>,

    /// Check that the index cluster is reachable, print its status, and exit.
    #[arg(long, conflicts_with_all = ["json", "output"])]
    health: bool,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };

    if cli.health {
        let client = ElasticsearchClient::new(&cfg.index)?;
        let health = client.health()?;
        println!(
            "Connected to {}: cluster '{}' status {}",
            cfg.index.url, health.cluster_name, health.status
        );
        return Ok(());
    }

    let repo = cli
        .repo
        .ok_or_else(|| anyhow!("a repository path is required"))?;
    let progress = cli.progress.unwrap_or_else(ProgressMode::default_for_tty);

    let pipeline = Pipeline::from_config(GitCli::new(), repo.clone(), &cfg.repository)?
        .with_progress(progress.reporter());

    let mut sink: Box<dyn Sink> = if cli.json {
        Box::new(BufferedJsonSink::new(cli.output))
    } else {
        let client = ElasticsearchClient::new(&cfg.index)?;
        Box::new(IndexSink::new(client, cfg.index.name.clone()))
    };

    let report = pipeline.run(sink.as_mut())?;
    print_summary(&repo, &report);
    Ok(())
}

fn print_summary(repo: &Path, report: &RunReport) {
    eprintln!("gitprov {}", repo.display());
    eprintln!("  indexed: {}", report.indexed);
    eprintln!("  skipped: {}", report.skipped);
    for skip in &report.skipped_paths {
        eprintln!("    {}: {}", skip.path, skip.reason);
    }
    eprintln!("ok");
}
