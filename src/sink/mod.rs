//! Document sinks.
//!
//! A [`Sink`] receives every assembled [`FileDocument`] in traversal order
//! and is finalized once after the last file.
//!
//! | Sink | Behavior |
//! |------|----------|
//! | [`IndexSink`] | Upserts each document into a search index as it arrives |
//! | [`BufferedJsonSink`] | Buffers documents and writes one JSON array at the end |

pub mod index;
pub mod json;

use anyhow::Result;

use crate::error::ProvenanceError;
use crate::models::FileDocument;

pub use index::{ElasticsearchClient, IndexClient, IndexSink};
pub use json::BufferedJsonSink;

pub trait Sink {
    /// Take ownership of one document.
    ///
    /// An error here is recorded as a skip for that document's file; it
    /// never aborts the run.
    fn accept(&mut self, document: FileDocument) -> Result<(), ProvenanceError>;

    /// Called once after every file has been processed. Errors are fatal
    /// for the run's output.
    fn finalize(&mut self) -> Result<()>;
}
