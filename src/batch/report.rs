//! Per-file results and the batch report.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::extract::ExtractedText;

/// Outcome of one unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Success,
    Error,
}

/// Result for exactly one discovered file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileResult {
    pub filename: String,
    pub path: PathBuf,
    /// Extracted text; empty on error or for documents without text.
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<String>,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub(super) fn filename_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

impl FileResult {
    pub fn success(path: &Path, extracted: ExtractedText, enrichment: Option<String>) -> Self {
        Self {
            filename: filename_of(path),
            path: path.to_path_buf(),
            text: extracted.text,
            page_count: Some(extracted.page_count),
            enrichment,
            status: FileStatus::Success,
            error: None,
        }
    }

    pub fn failure(path: &Path, error: impl Display) -> Self {
        Self {
            filename: filename_of(path),
            path: path.to_path_buf(),
            text: String::new(),
            page_count: None,
            enrichment: None,
            status: FileStatus::Error,
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == FileStatus::Success
    }
}

/// Counts derived from a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// All results of one batch run, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub results: Vec<FileResult>,
    /// Why the batch had nothing to do, if it didn't.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
    pub cancelled: bool,
}

impl BatchReport {
    /// A report with no results and an explanation.
    pub fn empty(diagnostic: impl Into<String>) -> Self {
        Self {
            results: Vec::new(),
            diagnostic: Some(diagnostic.into()),
            cancelled: false,
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            total: self.len(),
            succeeded: self.succeeded(),
            failed: self.failed(),
        }
    }

    /// One enrichment value picked uniformly among successful results, for display.
    pub fn representative_enrichment<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        let candidates: Vec<&str> = self
            .results
            .iter()
            .filter(|r| r.is_success())
            .filter_map(|r| r.enrichment.as_deref())
            .collect();
        candidates.choose(rng).copied()
    }
}
