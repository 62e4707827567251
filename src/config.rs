//! Configuration management for pdfharvest using the prefer crate.
//!
//! prefer locates `pdfharvest.{toml,json,yaml}`; the file is then parsed
//! with serde according to its extension. Environment overrides for the
//! LLM section are applied last.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::batch::{DEFAULT_EXTENSION, DEFAULT_WORKERS};
use crate::llm::{LlmConfig, PromptPair, DEFAULT_SYSTEM_PROMPT, DEFAULT_USER_PROMPT};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} config {path}: {message}")]
    Parse {
        path: String,
        format: &'static str,
        message: String,
    },
}

/// Batch processing settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatchConfig {
    /// Files processed at once
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// File extension to pick up, without the dot
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Run the enrichment call for every file
    #[serde(default)]
    pub enrich: bool,
    /// Keep the physical layout when extracting (`pdftotext -layout`)
    #[serde(default = "default_true")]
    pub layout: bool,
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            extension: default_extension(),
            enrich: false,
            layout: true,
        }
    }
}

/// The question asked once per file when enrichment is on.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EnrichmentConfig {
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// May contain `{name}` placeholders filled from `variables`
    #[serde(default = "default_user_prompt")]
    pub user_prompt: String,
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_user_prompt() -> String {
    DEFAULT_USER_PROMPT.to_string()
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            user_prompt: default_user_prompt(),
            variables: HashMap::new(),
        }
    }
}

impl EnrichmentConfig {
    /// Prompt to send. Without variables the user prompt is sent verbatim.
    pub fn prompt(&self) -> PromptPair {
        let prompt = PromptPair::new(&self.system_prompt, &self.user_prompt);
        if self.variables.is_empty() {
            prompt
        } else {
            prompt.with_inputs(self.variables.clone())
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    /// Where this config was loaded from.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load from `explicit` if given, otherwise discover a config file.
    ///
    /// An explicit path that cannot be loaded is an error; a discovered file
    /// that cannot be loaded is reported and defaults are used instead.
    pub async fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from_path(path).await;
        }

        match prefer::load("pdfharvest").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => return Ok(config),
                        Err(e) => warn!("{}; using defaults", e),
                    }
                }
            }
            Err(e) => debug!("No config file discovered: {}", e),
        }

        Ok(Self::default_with_env())
    }

    /// Defaults with environment variable overrides applied.
    pub fn default_with_env() -> Self {
        Self {
            llm: LlmConfig::from_env(),
            ..Self::default()
        }
    }

    /// Load configuration from a specific file path.
    /// Format is chosen by extension: TOML, YAML, otherwise JSON.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })?;

        let mut config = Self::parse(path, &contents)?;
        config.source_path = Some(path.to_path_buf());
        config.llm = config.llm.with_env_overrides();
        Ok(config)
    }

    fn parse(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let parse_err = |format: &'static str, message: String| ConfigError::Parse {
            path: path.display().to_string(),
            format,
            message,
        };

        match ext {
            "toml" => toml::from_str(contents).map_err(|e| parse_err("TOML", e.to_string())),
            "yaml" | "yml" => {
                serde_yaml::from_str(contents).map_err(|e| parse_err("YAML", e.to_string()))
            }
            _ => serde_json::from_str(contents).map_err(|e| parse_err("JSON", e.to_string())),
        }
    }

    /// Expand `~` in a user-supplied path.
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).as_ref())
    }
}
