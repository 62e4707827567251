//! Plain-text extraction from paginated documents.
//!
//! Pages are read in order through a `PageSource`; pages without
//! extractable text are dropped and the rest are joined with `\n`.

mod poppler;

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

pub use poppler::{check_tools, PopplerPages};

/// Errors that can occur during text extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Not a PDF document: {0}")]
    NotPdf(String),

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Extraction worker failed: {0}")]
    Worker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Text of a whole document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    /// Pages in the document, including those that yielded no text.
    pub page_count: u32,
}

/// Random access to the text of each page (1-based).
pub trait PageSource {
    fn page_count(&self) -> Result<u32, ExtractionError>;
    fn page_text(&self, page: u32) -> Result<String, ExtractionError>;
}

/// Read every page of `source` in order and join the non-empty ones.
///
/// Only pages with no text at all are dropped; whitespace is kept as
/// extracted. A page error aborts the whole document.
pub fn collect_pages(source: &dyn PageSource) -> Result<ExtractedText, ExtractionError> {
    let page_count = source.page_count()?;
    let mut parts = Vec::with_capacity(page_count as usize);

    for page in 1..=page_count {
        let text = source.page_text(page)?;
        if text.is_empty() {
            debug!("Page {}/{} has no text, skipping", page, page_count);
            continue;
        }
        parts.push(text);
    }

    Ok(ExtractedText {
        text: parts.join("\n"),
        page_count,
    })
}

/// Anything that can turn a file into text. Implementations block.
pub trait DocumentExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<ExtractedText, ExtractionError>;
}

/// PDF extractor backed by poppler-utils.
#[derive(Debug, Clone)]
pub struct TextExtractor {
    layout: bool,
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self { layout: true }
    }
}

impl TextExtractor {
    /// Create a new text extractor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle `pdftotext -layout`.
    pub fn with_layout(mut self, layout: bool) -> Self {
        self.layout = layout;
        self
    }
}

impl DocumentExtractor for TextExtractor {
    fn extract(&self, path: &Path) -> Result<ExtractedText, ExtractionError> {
        ensure_pdf(path)?;
        collect_pages(&PopplerPages::new(path).with_layout(self.layout))
    }
}

/// Open `path` and check its magic bytes. The handle is closed on return.
fn ensure_pdf(path: &Path) -> Result<(), ExtractionError> {
    let mut file = File::open(path)?;
    let mut buffer = [0u8; 1024];
    let bytes_read = file.read(&mut buffer)?;

    let is_pdf = infer::get(&buffer[..bytes_read])
        .map(|kind| kind.mime_type() == "application/pdf")
        .unwrap_or(false);

    if is_pdf {
        Ok(())
    } else {
        Err(ExtractionError::NotPdf(path.display().to_string()))
    }
}

/// Run `extractor` on the blocking worker pool so async callers keep running.
pub async fn extract_in_worker(
    extractor: Arc<dyn DocumentExtractor>,
    path: PathBuf,
) -> Result<ExtractedText, ExtractionError> {
    tokio::task::spawn_blocking(move || extractor.extract(&path))
        .await
        .map_err(|e| ExtractionError::Worker(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct FixedPages(Vec<Result<&'static str, &'static str>>);

    impl PageSource for FixedPages {
        fn page_count(&self) -> Result<u32, ExtractionError> {
            Ok(self.0.len() as u32)
        }

        fn page_text(&self, page: u32) -> Result<String, ExtractionError> {
            match self.0[(page - 1) as usize] {
                Ok(text) => Ok(text.to_string()),
                Err(msg) => Err(ExtractionError::ExtractionFailed(msg.to_string())),
            }
        }
    }

    #[test]
    fn test_empty_pages_are_skipped() {
        let pages = FixedPages(vec![Ok(""), Ok("hello"), Ok(""), Ok("world")]);
        let extracted = collect_pages(&pages).unwrap();
        assert_eq!(extracted.text, "hello\nworld");
        assert_eq!(extracted.page_count, 4);
    }

    #[test]
    fn test_whitespace_page_is_kept() {
        let pages = FixedPages(vec![Ok("first"), Ok(" "), Ok(""), Ok("  indented")]);
        assert_eq!(collect_pages(&pages).unwrap().text, "first\n \n  indented");
    }

    #[test]
    fn test_no_pages() {
        let extracted = collect_pages(&FixedPages(vec![])).unwrap();
        assert_eq!(extracted.text, "");
        assert_eq!(extracted.page_count, 0);
    }

    #[test]
    fn test_page_error_propagates() {
        let pages = FixedPages(vec![Ok("one"), Err("corrupt xref"), Ok("three")]);
        let err = collect_pages(&pages).unwrap_err();
        assert!(err.to_string().contains("corrupt xref"));
    }

    #[test]
    fn test_rejects_non_pdf_content() {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        file.write_all(b"just some text, not a pdf").unwrap();

        let err = TextExtractor::new().extract(file.path()).unwrap_err();
        assert!(matches!(err, ExtractionError::NotPdf(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = TextExtractor::new()
            .extract(Path::new("/nonexistent/nothing.pdf"))
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Io(_)));
    }

    #[tokio::test]
    async fn test_worker_panic_becomes_error() {
        struct Panics;
        impl DocumentExtractor for Panics {
            fn extract(&self, _path: &Path) -> Result<ExtractedText, ExtractionError> {
                panic!("parser bug");
            }
        }

        let err = extract_in_worker(Arc::new(Panics), PathBuf::from("x.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Worker(_)));
    }
}
