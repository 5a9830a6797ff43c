//! Run progress reporting.
//!
//! Reports which repository is being read and how many tracked files have
//! been processed so far. Progress is emitted on **stderr** so stdout stays
//! parseable when the JSON array is written there.

use std::io::Write;

/// A single progress event for a run.
#[derive(Clone, Debug)]
pub enum ProgressEvent {
    /// Listing tracked files (total unknown yet).
    Discovering { repo: String },
    /// File `n` of `total` is being processed.
    Processing { n: u64, total: u64, path: String },
}

/// Reports run progress. Implementations write to stderr (human or JSON).
pub trait ProgressReporter {
    fn report(&self, event: ProgressEvent);
}

/// Human-friendly progress on stderr: "gitprov  1,234 / 5,000 files  src/lib.rs".
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: ProgressEvent) {
        let line = match &event {
            ProgressEvent::Discovering { repo } => {
                format!("gitprov {}  listing tracked files...\n", repo)
            }
            ProgressEvent::Processing { n, total, path } => format!(
                "gitprov  {} / {} files  {}\n",
                format_number(*n),
                format_number(*total),
                path
            ),
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        let obj = match &event {
            ProgressEvent::Discovering { repo } => serde_json::json!({
                "event": "progress",
                "phase": "discovering",
                "repo": repo
            }),
            ProgressEvent::Processing { n, total, path } => serde_json::json!({
                "event": "progress",
                "phase": "processing",
                "n": n,
                "total": total,
                "path": path
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
