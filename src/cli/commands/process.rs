//! Batch processing command.

use std::path::Path;
use std::sync::Arc;

use console::style;
use serde::Serialize;
use tokio::sync::{mpsc, watch};

use pdfharvest::batch::{BatchReport, BatchSummary};
use pdfharvest::{BatchOrchestrator, CallOverrides, Config, LlmClient, LlmEnricher, TextExtractor};

use crate::cli::helpers::truncate;
use crate::cli::progress::spawn_progress;

pub struct ProcessOptions {
    pub enrich: bool,
    pub workers: usize,
    pub extension: String,
    pub json: bool,
    pub preview: Option<usize>,
    pub overrides: CallOverrides,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    summary: BatchSummary,
    report: &'a BatchReport,
}

/// Extract every matching file in `dir` and print the report.
pub async fn cmd_process(config: &Config, dir: &Path, options: ProcessOptions) -> anyhow::Result<()> {
    let extractor = Arc::new(TextExtractor::new().with_layout(config.batch.layout));
    let mut orchestrator = BatchOrchestrator::new(extractor)
        .with_workers(options.workers)
        .with_extension(&options.extension);

    if options.enrich {
        let client = LlmClient::new(config.llm.clone())?;
        let enricher = LlmEnricher::new(Arc::new(client), config.enrichment.prompt())
            .with_overrides(options.overrides);
        orchestrator = orchestrator.with_enricher(Arc::new(enricher));
    }

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{} Interrupted, finishing in-flight files...", style("!").yellow());
            let _ = cancel_tx.send(true);
        }
    });

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let progress = spawn_progress(events_rx, options.json);

    let orchestrator = orchestrator
        .with_cancellation(cancel_rx)
        .with_events(events_tx);
    let report = orchestrator.run(dir).await;
    drop(orchestrator);
    let _ = progress.await;

    if options.json {
        let output = JsonOutput {
            summary: report.summary(),
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_report(&report, options.preview);
    Ok(())
}

fn print_report(report: &BatchReport, preview: Option<usize>) {
    if let Some(ref diagnostic) = report.diagnostic {
        println!("{} {}", style("!").yellow(), diagnostic);
        return;
    }

    if let Some(chars) = preview {
        for result in report.results.iter().filter(|r| r.is_success()) {
            println!("{} {}", style("▸").cyan(), style(&result.filename).bold());
            println!("  {}", truncate(&result.text.replace('\n', " "), chars));
        }
        println!();
    }

    let failures: Vec<_> = report.results.iter().filter(|r| !r.is_success()).collect();
    if !failures.is_empty() {
        println!("{}", style("Failures:").red().bold());
        for result in failures {
            println!(
                "  {} {}: {}",
                style("✗").red(),
                result.filename,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
        println!();
    }

    let summary = report.summary();
    println!("{}", style("Summary").bold());
    println!("  Total files:  {}", summary.total);
    println!("  Succeeded:    {}", style(summary.succeeded).green());
    println!("  Failed:       {}", style(summary.failed).red());
    if report.cancelled {
        println!("  {}", style("Run was cancelled").yellow());
    }

    let mut rng = rand::thread_rng();
    if let Some(enrichment) = report.representative_enrichment(&mut rng) {
        println!();
        println!("{} {}", style("Enrichment sample:").bold(), enrichment);
    }
}
