//! # git-provenance
//!
//! Extracts per-file Git provenance (latest commit, full history, line
//! blame and committed content) and publishes one document per tracked
//! file to an Elasticsearch-compatible index or as a single JSON array.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │   Backend    │──▶│    Reader    │──▶│   assemble   │──▶│     Sink     │
//! │ git / memory │   │ typed errors │   │ FileDocument │   │ index / JSON │
//! └──────────────┘   └──────────────┘   └──────────────┘   └──────────────┘
//!        Pipeline: sequential, one file at a time, skips → RunReport
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! gitprov ./my-repo                      # upsert into http://localhost:9200/git-metadata
//! gitprov ./my-repo --json > out.json    # one JSON array on stdout
//! gitprov --health                       # probe the index cluster
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`backend`] | Version-control query contract and implementations |
//! | [`reader`] | Per-file history, blame and content for one repository |
//! | [`assemble`] | Pure document assembly |
//! | [`pipeline`] | Run orchestration and skip policy |
//! | [`sink`] | Index and buffered JSON sinks |
//! | [`config`] | TOML configuration |
//! | [`models`] | Core data types |
//! | [`error`] | Error taxonomy |
//! | [`progress`] | Progress reporting on stderr |
//! | [`logging`] | `tracing` subscriber setup |

pub mod assemble;
pub mod backend;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod reader;
pub mod sink;
