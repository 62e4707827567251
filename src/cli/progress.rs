//! Progress display for batch runs.

use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use pdfharvest::batch::{BatchEvent, FileStatus};

use super::helpers::truncate;

fn new_bar(hidden: bool) -> ProgressBar {
    let pb = ProgressBar::new(0);
    if hidden {
        pb.set_draw_target(ProgressDrawTarget::hidden());
        return pb;
    }
    if let Ok(bar_style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    ) {
        pb.set_style(bar_style.progress_chars("#>-"));
    }
    pb
}

/// Drive a progress bar from batch events until the sender side is dropped.
pub fn spawn_progress(mut events: mpsc::UnboundedReceiver<BatchEvent>, hidden: bool) -> JoinHandle<()> {
    tokio::spawn(async move {
        let pb = new_bar(hidden);

        while let Some(event) = events.recv().await {
            match event {
                BatchEvent::Discovered { total } => pb.set_length(total as u64),
                BatchEvent::Started { filename } => {
                    pb.set_message(format!("Processing file: {}", truncate(&filename, 40)))
                }
                BatchEvent::Finished { filename, status } => {
                    if status == FileStatus::Error {
                        pb.println(format!("  {} {}", style("✗").red(), filename));
                    }
                    pb.inc(1);
                }
            }
        }

        pb.finish_and_clear();
    })
}
