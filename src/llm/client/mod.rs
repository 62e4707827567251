//! LLM client for single-turn text generation.
//!
//! Every call renders its prompt, merges per-call overrides onto the
//! client defaults, then waits for a permit from the client's
//! `ConcurrencyLimit` before the request goes out.

mod config;
mod limiter;
mod prompts;
mod transport;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error};

pub use config::{CallOverrides, CallParameters, LlmConfig};
pub use limiter::ConcurrencyLimit;
pub use prompts::{interpolate, PromptPair, DEFAULT_SYSTEM_PROMPT, DEFAULT_USER_PROMPT};
pub use transport::{ChatRequest, ChatTransport, OpenAiTransport};

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Missing credential or unusable settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// User prompt template could not be interpolated
    #[error("Formatting error: {0}")]
    Formatting(String),

    /// Failed to reach the LLM service
    #[error("Connection error: {0}")]
    Connection(String),

    /// Service answered with a non-success status
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// Response body was not what we expected
    #[error("Parse error: {0}")]
    Parse(String),
}

impl LlmError {
    /// Whether the error came from talking to the service.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            LlmError::Connection(_) | LlmError::Api { .. } | LlmError::Parse(_)
        )
    }
}

/// Pick the explicit key if non-empty, otherwise the environment's.
pub fn resolve_api_key(explicit: Option<&str>, env: Option<String>) -> Result<String, LlmError> {
    explicit
        .map(str::to_string)
        .or(env)
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| {
            LlmError::Configuration(
                "OPENAI_API_KEY is not set in the environment or provided in config".to_string(),
            )
        })
}

/// LLM client with instance defaults and a private request limit.
pub struct LlmClient {
    defaults: CallParameters,
    limiter: ConcurrencyLimit,
    transport: Arc<dyn ChatTransport>,
}

impl LlmClient {
    /// Create a client talking to the configured endpoint.
    ///
    /// Fails with `LlmError::Configuration` when no API key is configured
    /// and `OPENAI_API_KEY` is not set.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let api_key = resolve_api_key(
            config.api_key.as_deref(),
            std::env::var("OPENAI_API_KEY").ok(),
        )?;
        let transport = OpenAiTransport::new(
            &config.endpoint,
            &api_key,
            Duration::from_secs(config.timeout_secs),
        )?;

        Ok(Self::with_transport(
            config.call_parameters(),
            ConcurrencyLimit::new(config.max_concurrency),
            Arc::new(transport),
        ))
    }

    /// Create a client over an arbitrary transport.
    pub fn with_transport(
        defaults: CallParameters,
        limiter: ConcurrencyLimit,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        Self {
            defaults,
            limiter,
            transport,
        }
    }

    pub fn defaults(&self) -> &CallParameters {
        &self.defaults
    }

    pub fn limiter(&self) -> &ConcurrencyLimit {
        &self.limiter
    }

    /// Send one system + user exchange and return the response text.
    ///
    /// Transport errors are logged and returned unchanged; nothing is retried.
    pub async fn call(
        &self,
        prompt: &PromptPair,
        overrides: &CallOverrides,
    ) -> Result<String, LlmError> {
        let request = ChatRequest {
            system: prompt.system.clone(),
            user: prompt.render_user()?,
            params: self.defaults.merge(overrides),
        };
        if request.params.max_tokens == 0 {
            return Err(LlmError::Configuration(
                "max_tokens must be positive".to_string(),
            ));
        }

        let result = self
            .limiter
            .run(async {
                debug!(
                    "Calling {} ({} of {} permits in use)",
                    request.params.model,
                    self.limiter.in_flight(),
                    self.limiter.capacity()
                );
                self.transport.complete(&request).await
            })
            .await;

        if let Err(ref e) = result {
            error!("Error calling LLM API: {}", e);
        }
        result
    }

    /// `call` with no placeholders and no overrides.
    pub async fn ask(&self, system: &str, user: &str) -> Result<String, LlmError> {
        self.call(&PromptPair::new(system, user), &CallOverrides::default())
            .await
    }
}
