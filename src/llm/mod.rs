//! LLM integration for document enrichment and ad-hoc prompts.
//!
//! Talks to an OpenAI-compatible chat completions endpoint, with a bounded
//! number of requests in flight per client.

mod client;

pub use client::{
    interpolate, resolve_api_key, CallOverrides, CallParameters, ChatRequest, ChatTransport,
    ConcurrencyLimit, LlmClient, LlmConfig, LlmError, OpenAiTransport, PromptPair,
    DEFAULT_SYSTEM_PROMPT, DEFAULT_USER_PROMPT,
};
