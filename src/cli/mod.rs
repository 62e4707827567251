//! Command-line interface for pdfharvest.

mod commands;
mod helpers;
mod progress;

pub use commands::{is_verbose, run};
