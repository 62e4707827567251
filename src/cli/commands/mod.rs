//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod ask;
mod check;
mod extract;
mod process;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use pdfharvest::llm::{DEFAULT_SYSTEM_PROMPT, DEFAULT_USER_PROMPT};
use pdfharvest::Config;

use super::helpers::parse_key_val;

#[derive(Parser)]
#[command(name = "pdfharvest")]
#[command(about = "Batch PDF text extraction with optional LLM enrichment")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

/// Per-call generation overrides shared by commands that talk to the LLM.
#[derive(clap::Args, Debug, Default)]
pub struct GenerationArgs {
    /// Model to use instead of the configured one
    #[arg(long)]
    model: Option<String>,
    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,
    /// Maximum tokens to generate
    #[arg(long)]
    max_tokens: Option<u32>,
    /// Frequency penalty
    #[arg(long)]
    frequency_penalty: Option<f32>,
}

impl GenerationArgs {
    fn overrides(&self) -> pdfharvest::CallOverrides {
        pdfharvest::CallOverrides {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            frequency_penalty: self.frequency_penalty,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Send one prompt to the LLM and print the reply
    Ask {
        /// System instruction
        #[arg(long, default_value = DEFAULT_SYSTEM_PROMPT)]
        system: String,
        /// User instruction; may contain {name} placeholders
        #[arg(long, default_value = DEFAULT_USER_PROMPT)]
        user: String,
        /// Placeholder value (repeatable)
        #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_key_val)]
        vars: Vec<(String, String)>,
        #[command(flatten)]
        generation: GenerationArgs,
    },

    /// Print the text of a single PDF
    Extract {
        /// PDF file to extract
        file: String,
        /// Do not preserve the physical layout
        #[arg(long)]
        raw: bool,
    },

    /// Extract every PDF in a directory
    Process {
        /// Directory containing the documents
        dir: String,
        /// Ask the LLM for an auxiliary value alongside each file
        #[arg(short, long)]
        enrich: bool,
        /// Number of files processed at once
        #[arg(short, long)]
        workers: Option<usize>,
        /// File extension to pick up
        #[arg(long)]
        extension: Option<String>,
        /// Print the report as JSON instead of a summary
        #[arg(long)]
        json: bool,
        /// Show the first N characters of each file's text
        #[arg(long, value_name = "CHARS")]
        preview: Option<usize>,
        #[command(flatten)]
        generation: GenerationArgs,
    },

    /// Check tool and credential availability
    Check,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Ask {
            system,
            user,
            vars,
            generation,
        } => ask::cmd_ask(&config, system, user, vars, &generation).await,
        Commands::Extract { file, raw } => {
            extract::cmd_extract(&Config::expand_path(&file), !raw && config.batch.layout).await
        }
        Commands::Process {
            dir,
            enrich,
            workers,
            extension,
            json,
            preview,
            generation,
        } => {
            let options = process::ProcessOptions {
                enrich: enrich || config.batch.enrich,
                workers: workers.unwrap_or(config.batch.workers),
                extension: extension.unwrap_or_else(|| config.batch.extension.clone()),
                json,
                preview,
                overrides: generation.overrides(),
            };
            process::cmd_process(&config, &Config::expand_path(&dir), options).await
        }
        Commands::Check => check::cmd_check(&config).await,
    }
}
