//! Batch processing of a directory of documents.
//!
//! One unit of work per discovered file: text extraction on the blocking
//! pool and, when an enricher is configured, an enrichment call running
//! concurrently with it. A failing unit turns into an error-status
//! `FileResult`; it never aborts its siblings.

mod discover;
mod enrich;
mod orchestrator;
mod report;

pub use discover::{discover_documents, DiscoveryError};
pub use enrich::{Enricher, LlmEnricher};
pub use orchestrator::{BatchEvent, BatchOrchestrator, DEFAULT_EXTENSION, DEFAULT_WORKERS};
pub use report::{BatchReport, BatchSummary, FileResult, FileStatus};
