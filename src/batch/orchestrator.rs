//! Fan-out/fan-in over the files of one directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{mpsc, watch, Semaphore};
use tracing::{debug, error, info, warn};

use super::discover::discover_documents;
use super::enrich::Enricher;
use super::report::{filename_of, BatchReport, FileResult, FileStatus};
use crate::extract::{extract_in_worker, DocumentExtractor};

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_EXTENSION: &str = "pdf";

const CANCELLED: &str = "cancelled";

/// Progress notifications emitted while a batch runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    Discovered { total: usize },
    Started { filename: String },
    Finished { filename: String, status: FileStatus },
}

/// Drives one unit of work per discovered file.
pub struct BatchOrchestrator {
    extractor: Arc<dyn DocumentExtractor>,
    enricher: Option<Arc<dyn Enricher>>,
    workers: usize,
    extension: String,
    cancel: Option<watch::Receiver<bool>>,
    events: Option<mpsc::UnboundedSender<BatchEvent>>,
}

impl BatchOrchestrator {
    pub fn new(extractor: Arc<dyn DocumentExtractor>) -> Self {
        Self {
            extractor,
            enricher: None,
            workers: DEFAULT_WORKERS,
            extension: DEFAULT_EXTENSION.to_string(),
            cancel: None,
            events: None,
        }
    }

    /// Run `enricher` alongside extraction for every file.
    pub fn with_enricher(mut self, enricher: Arc<dyn Enricher>) -> Self {
        self.enricher = Some(enricher);
        self
    }

    /// Maximum files processed at once (at least one).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// Stop early once the channel holds `true`.
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_events(mut self, events: mpsc::UnboundedSender<BatchEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Process every matching file in `dir`.
    ///
    /// Never fails: a missing or empty directory yields an empty report with a
    /// diagnostic, and each failed file becomes an error-status result.
    pub async fn run(&self, dir: &Path) -> BatchReport {
        let files = match discover_documents(dir, &self.extension) {
            Ok(files) => files,
            Err(e) => {
                warn!("{}", e);
                return BatchReport::empty(e.to_string());
            }
        };

        if files.is_empty() {
            let msg = format!(
                "No .{} files found in '{}'",
                self.extension,
                dir.display()
            );
            warn!("{}", msg);
            return BatchReport::empty(msg);
        }

        info!(
            "Processing {} files from {} with {} workers",
            files.len(),
            dir.display(),
            self.workers
        );
        self.emit(BatchEvent::Discovered { total: files.len() });

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut handles = Vec::with_capacity(files.len());

        for path in files {
            let semaphore = semaphore.clone();
            let extractor = self.extractor.clone();
            let enricher = self.enricher.clone();
            let cancel = self.cancel.clone();
            let events = self.events.clone();
            let task_path = path.clone();

            let handle = tokio::spawn(async move {
                let work = async {
                    let _permit = semaphore.acquire_owned().await;
                    send(&events, || BatchEvent::Started {
                        filename: filename_of(&task_path),
                    });
                    process_file(&task_path, extractor, enricher).await
                };

                let result = tokio::select! {
                    biased;
                    _ = cancelled(cancel) => FileResult::failure(&task_path, CANCELLED),
                    result = work => result,
                };

                send(&events, || BatchEvent::Finished {
                    filename: result.filename.clone(),
                    status: result.status,
                });
                result
            });

            handles.push((path, handle));
        }

        let (paths, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        let results: Vec<FileResult> = futures::future::join_all(handles)
            .await
            .into_iter()
            .zip(paths)
            .map(|(joined, path)| match joined {
                Ok(result) => result,
                Err(e) => {
                    error!("Worker for {} panicked: {}", path.display(), e);
                    FileResult::failure(&path, format!("worker panicked: {}", e))
                }
            })
            .collect();

        let cancelled = results
            .iter()
            .any(|r| r.error.as_deref() == Some(CANCELLED));

        BatchReport {
            results,
            diagnostic: None,
            cancelled,
        }
    }

    fn emit(&self, event: BatchEvent) {
        send(&self.events, || event);
    }
}

fn send(events: &Option<mpsc::UnboundedSender<BatchEvent>>, event: impl FnOnce() -> BatchEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event());
    }
}

/// Resolves once cancellation is requested; never if it can't be.
async fn cancelled(cancel: Option<watch::Receiver<bool>>) {
    match cancel {
        Some(mut rx) => {
            if rx.wait_for(|requested| *requested).await.is_err() {
                std::future::pending::<()>().await;
            }
        }
        None => std::future::pending::<()>().await,
    }
}

/// Extraction and optional enrichment for one file, run concurrently.
async fn process_file(
    path: &Path,
    extractor: Arc<dyn DocumentExtractor>,
    enricher: Option<Arc<dyn Enricher>>,
) -> FileResult {
    let extraction = extract_in_worker(extractor, PathBuf::from(path));

    let (extracted, enrichment) = match enricher {
        Some(enricher) => {
            let (extracted, enrichment) = tokio::join!(extraction, enricher.enrich());
            let enrichment = match enrichment {
                Ok(text) => Some(text),
                Err(e) => {
                    warn!("Enrichment failed for {}: {}", path.display(), e);
                    None
                }
            };
            (extracted, enrichment)
        }
        None => (extraction.await, None),
    };

    match extracted {
        Ok(extracted) => {
            debug!(
                "Extracted {} chars from {} ({} pages)",
                extracted.text.len(),
                path.display(),
                extracted.page_count
            );
            FileResult::success(path, extracted, enrichment)
        }
        Err(e) => {
            warn!("Error processing {}: {}", path.display(), e);
            FileResult::failure(path, e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{ExtractedText, ExtractionError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct ByName;

    impl DocumentExtractor for ByName {
        fn extract(&self, path: &Path) -> Result<ExtractedText, ExtractionError> {
            let name = filename_of(path);
            if name.starts_with("broken") {
                return Err(ExtractionError::ExtractionFailed("bad xref".to_string()));
            }
            Ok(ExtractedText {
                text: format!("text of {}", name),
                page_count: 2,
            })
        }
    }

    struct Slow {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl DocumentExtractor for Slow {
        fn extract(&self, _path: &Path) -> Result<ExtractedText, ExtractionError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(30));
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(ExtractedText {
                text: String::new(),
                page_count: 0,
            })
        }
    }

    struct FailingEnricher;

    #[async_trait]
    impl Enricher for FailingEnricher {
        async fn enrich(&self) -> anyhow::Result<String> {
            anyhow::bail!("rate limited")
        }
    }

    fn dir_with(names: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in names {
            std::fs::write(dir.path().join(name), b"%PDF-1.4").unwrap();
        }
        dir
    }

    #[tokio::test]
    async fn test_results_in_discovery_order() {
        let dir = dir_with(&["c.pdf", "a.pdf", "b.pdf"]);
        let report = BatchOrchestrator::new(Arc::new(ByName)).run(dir.path()).await;

        let names: Vec<_> = report.results.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf", "c.pdf"]);
        assert_eq!(report.results[0].text, "text of a.pdf");
        assert_eq!(report.results[0].page_count, Some(2));
        assert!(!report.cancelled);
    }

    #[tokio::test]
    async fn test_worker_cap() {
        let names: Vec<String> = (0..8).map(|i| format!("{}.pdf", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let dir = dir_with(&refs);
        let extractor = Arc::new(Slow {
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });

        let report = BatchOrchestrator::new(extractor.clone())
            .with_workers(2)
            .run(dir.path())
            .await;

        assert_eq!(report.len(), 8);
        assert!(extractor.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_enrichment_failure_keeps_success() {
        let dir = dir_with(&["a.pdf"]);
        let report = BatchOrchestrator::new(Arc::new(ByName))
            .with_enricher(Arc::new(FailingEnricher))
            .run(dir.path())
            .await;

        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.results[0].enrichment, None);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let dir = dir_with(&["a.pdf", "b.pdf"]);
        let (tx, rx) = watch::channel(true);

        let report = BatchOrchestrator::new(Arc::new(ByName))
            .with_cancellation(rx)
            .run(dir.path())
            .await;
        drop(tx);

        assert!(report.cancelled);
        assert_eq!(report.len(), 2);
        assert_eq!(report.failed(), 2);
        assert_eq!(report.results[0].error.as_deref(), Some("cancelled"));
    }

    struct SlowByName;

    impl DocumentExtractor for SlowByName {
        fn extract(&self, path: &Path) -> Result<ExtractedText, ExtractionError> {
            if filename_of(path).starts_with("slow") {
                std::thread::sleep(Duration::from_millis(400));
            }
            Ok(ExtractedText {
                text: filename_of(path),
                page_count: 1,
            })
        }
    }

    #[tokio::test]
    async fn test_cancelled_mid_run_keeps_finished_results() {
        let dir = dir_with(&["fast.pdf", "slow.pdf"]);
        let (tx, rx) = watch::channel(false);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let _ = tx.send(true);
        });

        let report = BatchOrchestrator::new(Arc::new(SlowByName))
            .with_cancellation(rx)
            .run(dir.path())
            .await;

        assert!(report.cancelled);
        assert_eq!(report.len(), 2);
        assert_eq!(report.results[0].filename, "fast.pdf");
        assert_eq!(report.results[0].status, FileStatus::Success);
        assert_eq!(report.results[0].text, "fast.pdf");
        assert_eq!(report.results[1].filename, "slow.pdf");
        assert_eq!(report.results[1].status, FileStatus::Error);
        assert_eq!(report.results[1].error.as_deref(), Some("cancelled"));
    }

    #[tokio::test]
    async fn test_signal_after_all_finished_is_not_cancelled() {
        let dir = dir_with(&["a.pdf", "b.pdf"]);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();

        // Raise the signal once both files have reported back.
        let signaller = tokio::spawn(async move {
            let mut finished = 0;
            while let Some(event) = events_rx.recv().await {
                if let BatchEvent::Finished { .. } = event {
                    finished += 1;
                    if finished == 2 {
                        let _ = cancel_tx.send(true);
                    }
                }
            }
        });

        let orchestrator = BatchOrchestrator::new(Arc::new(ByName))
            .with_cancellation(cancel_rx)
            .with_events(events_tx);
        let report = orchestrator.run(dir.path()).await;
        drop(orchestrator);
        signaller.await.unwrap();

        assert_eq!(report.succeeded(), 2);
        assert!(!report.cancelled);
    }

    #[tokio::test]
    async fn test_events() {
        let dir = dir_with(&["a.pdf", "broken.pdf"]);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let report = BatchOrchestrator::new(Arc::new(ByName))
            .with_events(tx)
            .run(dir.path())
            .await;
        assert_eq!(report.len(), 2);

        let mut finished = Vec::new();
        let mut discovered = None;
        while let Ok(event) = rx.try_recv() {
            match event {
                BatchEvent::Discovered { total } => discovered = Some(total),
                BatchEvent::Finished { filename, status } => finished.push((filename, status)),
                BatchEvent::Started { .. } => {}
            }
        }
        finished.sort();
        assert_eq!(discovered, Some(2));
        assert_eq!(
            finished,
            vec![
                ("a.pdf".to_string(), FileStatus::Success),
                ("broken.pdf".to_string(), FileStatus::Error),
            ]
        );
    }
}
