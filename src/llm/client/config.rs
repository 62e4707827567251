//! LLM client configuration.
//!
//! `LlmConfig` is the `[llm]` section of the config file. Generation
//! settings collapse into `CallParameters`, the per-client defaults that
//! each call may partially override with `CallOverrides`.

use serde::Deserialize;
use tracing::warn;

use super::limiter::ConcurrencyLimit;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_FREQUENCY_PENALTY: f32 = 0.0;
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Sampling parameters sent with a single request.
#[derive(Debug, Clone, PartialEq)]
pub struct CallParameters {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub frequency_penalty: f32,
}

impl Default for CallParameters {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            frequency_penalty: DEFAULT_FREQUENCY_PENALTY,
        }
    }
}

impl CallParameters {
    /// Apply per-call overrides. Set fields win, unset fields keep `self`.
    pub fn merge(&self, overrides: &CallOverrides) -> CallParameters {
        CallParameters {
            model: overrides
                .model
                .clone()
                .unwrap_or_else(|| self.model.clone()),
            temperature: overrides.temperature.unwrap_or(self.temperature),
            max_tokens: overrides.max_tokens.unwrap_or(self.max_tokens),
            frequency_penalty: overrides
                .frequency_penalty
                .unwrap_or(self.frequency_penalty),
        }
    }
}

/// Per-call changes to a client's default `CallParameters`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallOverrides {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub frequency_penalty: Option<f32>,
}

impl CallOverrides {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn frequency_penalty(mut self, frequency_penalty: f32) -> Self {
        self.frequency_penalty = Some(frequency_penalty);
        self
    }

}

/// Configuration for the LLM client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API (without `/v1`)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// API key. Prefer OPENAI_API_KEY / LLM_API_KEY over writing it to disk.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model used when a call does not override it
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens in response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub frequency_penalty: f32,
    /// Maximum requests in flight for one client
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Per-request timeout; slow models need a generous value
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_max_concurrency() -> usize {
    ConcurrencyLimit::DEFAULT_CAPACITY
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            frequency_penalty: DEFAULT_FREQUENCY_PENALTY,
            max_concurrency: default_max_concurrency(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `LLM_API_KEY`: API key (wins over `OPENAI_API_KEY`)
    /// - `OPENAI_API_KEY`: API key, used when no key is configured
    /// - `LLM_ENDPOINT`: API base URL
    /// - `LLM_MODEL`: Model name
    /// - `LLM_TEMPERATURE`: Sampling temperature
    /// - `LLM_MAX_TOKENS`: Maximum tokens in response
    /// - `LLM_FREQUENCY_PENALTY`: Frequency penalty
    /// - `LLM_MAX_CONCURRENCY`: Requests in flight per client
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("LLM_API_KEY") {
            self.api_key = Some(val);
        } else if self.api_key.is_none() {
            self.api_key = std::env::var("OPENAI_API_KEY").ok();
        }
        if let Ok(val) = std::env::var("LLM_ENDPOINT") {
            self.endpoint = val;
        }
        if let Ok(val) = std::env::var("LLM_MODEL") {
            self.model = val;
        }
        if let Some(t) = parse_env("LLM_TEMPERATURE") {
            self.temperature = t;
        }
        if let Some(n) = parse_env("LLM_MAX_TOKENS") {
            self.max_tokens = n;
        }
        if let Some(p) = parse_env("LLM_FREQUENCY_PENALTY") {
            self.frequency_penalty = p;
        }
        if let Some(n) = parse_env("LLM_MAX_CONCURRENCY") {
            self.max_concurrency = n;
        }
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    /// Instance-wide defaults for each call.
    pub fn call_parameters(&self) -> CallParameters {
        CallParameters {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            frequency_penalty: self.frequency_penalty,
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let val = std::env::var(key).ok()?;
    match val.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("Ignoring unparsable {}={:?}", key, val);
            None
        }
    }
}
