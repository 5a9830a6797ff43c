//! Live indexing into an Elasticsearch-compatible document store.
//!
//! [`IndexSink`] is generic over the [`IndexClient`] write contract so the
//! pipeline can be exercised without a running cluster.
//! [`ElasticsearchClient`] is the HTTP implementation:
//!
//! - upsert: `PUT {url}/{index}/_doc/{id}` with the document as the body
//! - health: `GET {url}/_cluster/health`
//!
//! Document ids are file paths, so they are percent-encoded as a single
//! path segment (`src/lib.rs` → `src%2Flib.rs`). Writes are not retried.

use anyhow::{anyhow, bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use super::Sink;
use crate::config::IndexConfig;
use crate::error::{summarize, ProvenanceError};
use crate::models::FileDocument;

/// Write contract of a document index: insert-or-overwrite by id.
pub trait IndexClient {
    fn upsert(&self, collection: &str, id: &str, document: &Value) -> Result<()>;
}

/// Cluster health as reported by `GET /_cluster/health`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterHealth {
    #[serde(default)]
    pub cluster_name: String,
    pub status: String,
}

pub struct ElasticsearchClient {
    client: Client,
    base: Url,
}

impl ElasticsearchClient {
    pub fn new(config: &IndexConfig) -> Result<Self> {
        let base = Url::parse(&config.url)
            .with_context(|| format!("Invalid index url: {}", config.url))?;
        if base.cannot_be_a_base() {
            bail!("Invalid index url: {}", config.url);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, base })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("index url cannot carry a path: {}", self.base))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// URL a document with `id` is written to.
    pub fn document_url(&self, collection: &str, id: &str) -> Result<Url> {
        self.endpoint(&[collection, "_doc", id])
    }

    pub fn health(&self) -> Result<ClusterHealth> {
        let url = self.endpoint(&["_cluster", "health"])?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .with_context(|| format!("Failed to connect to {}", self.base))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            bail!("{} returned HTTP {}: {}", url, status, body.trim());
        }

        response
            .json::<ClusterHealth>()
            .context("Unexpected cluster health response")
    }
}

impl IndexClient for ElasticsearchClient {
    fn upsert(&self, collection: &str, id: &str, document: &Value) -> Result<()> {
        let url = self.document_url(collection, id)?;
        let response = self
            .client
            .put(url)
            .json(document)
            .send()
            .with_context(|| format!("Failed to reach index at {}", self.base))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let detail: String = body.trim().chars().take(200).collect();
            bail!("HTTP {}: {}", status, detail);
        }

        Ok(())
    }
}

/// Sink that writes each document to the index as soon as it is accepted.
pub struct IndexSink<C> {
    client: C,
    collection: String,
}

impl<C: IndexClient> IndexSink<C> {
    pub fn new(client: C, collection: impl Into<String>) -> Self {
        Self {
            client,
            collection: collection.into(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

impl<C: IndexClient> Sink for IndexSink<C> {
    fn accept(&mut self, document: FileDocument) -> Result<(), ProvenanceError> {
        let body = serde_json::to_value(&document)
            .map_err(|e| ProvenanceError::IndexWriteFailure(e.to_string()))?;

        self.client
            .upsert(&self.collection, &document.file_path, &body)
            .map_err(|e| ProvenanceError::IndexWriteFailure(summarize(&e)))
    }

    fn finalize(&mut self) -> Result<()> {
        Ok(())
    }
}
