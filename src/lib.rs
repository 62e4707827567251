//! pdfharvest - batch PDF text extraction with optional LLM enrichment.
//!
//! Extracts the text of every PDF in a directory, optionally asking an
//! OpenAI-compatible model for an auxiliary value per file, and collects
//! one result per file into a report.

pub mod batch;
pub mod config;
pub mod extract;
pub mod llm;

pub use batch::{BatchOrchestrator, BatchReport, Enricher, FileResult, FileStatus, LlmEnricher};
pub use config::Config;
pub use extract::{DocumentExtractor, ExtractionError, TextExtractor};
pub use llm::{CallOverrides, LlmClient, LlmConfig, LlmError, PromptPair};
