//! Buffered JSON output.
//!
//! Collects every document in memory and writes them as a single
//! pretty-printed JSON array when the run finishes. Memory use grows with
//! total history and content size of the repository.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;

use super::Sink;
use crate::error::ProvenanceError;
use crate::models::FileDocument;

pub struct BufferedJsonSink {
    documents: Vec<FileDocument>,
    output: Option<PathBuf>,
}

impl BufferedJsonSink {
    /// If `output` is `Some`, the array is written to that file on
    /// finalize. Otherwise it goes to stdout for piping.
    pub fn new(output: Option<PathBuf>) -> Self {
        Self {
            documents: Vec::new(),
            output,
        }
    }

    pub fn documents(&self) -> &[FileDocument] {
        &self.documents
    }

    /// Serialize the buffered documents as one JSON array.
    pub fn render(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.documents).context("Failed to serialize documents")
    }
}

impl Sink for BufferedJsonSink {
    fn accept(&mut self, document: FileDocument) -> Result<(), ProvenanceError> {
        self.documents.push(document);
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        let json = self.render()?;

        match &self.output {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, &json)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                tracing::info!(
                    documents = self.documents.len(),
                    path = %path.display(),
                    "wrote JSON output"
                );
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{}", json)?;
                stdout.flush()?;
            }
        }

        Ok(())
    }
}
