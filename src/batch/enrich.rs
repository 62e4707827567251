//! Optional enrichment collaborator.

use std::sync::Arc;

use async_trait::async_trait;

use crate::llm::{CallOverrides, LlmClient, PromptPair};

/// Produces an auxiliary string to attach to a file result.
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(&self) -> anyhow::Result<String>;
}

/// Enricher that asks the LLM a fixed question.
pub struct LlmEnricher {
    client: Arc<LlmClient>,
    prompt: PromptPair,
    overrides: CallOverrides,
}

impl LlmEnricher {
    pub fn new(client: Arc<LlmClient>, prompt: PromptPair) -> Self {
        Self {
            client,
            prompt,
            overrides: CallOverrides::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: CallOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

#[async_trait]
impl Enricher for LlmEnricher {
    async fn enrich(&self) -> anyhow::Result<String> {
        let text = self.client.call(&self.prompt, &self.overrides).await?;
        Ok(text.trim().to_string())
    }
}
