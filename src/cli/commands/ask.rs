//! Single prompt command.

use std::collections::HashMap;

use pdfharvest::{Config, LlmClient, PromptPair};

use super::GenerationArgs;

/// Send one system + user prompt and print the response.
pub async fn cmd_ask(
    config: &Config,
    system: String,
    user: String,
    vars: Vec<(String, String)>,
    generation: &GenerationArgs,
) -> anyhow::Result<()> {
    let client = LlmClient::new(config.llm.clone())?;

    let mut prompt = PromptPair::new(system, user);
    if !vars.is_empty() {
        prompt = prompt.with_inputs(vars.into_iter().collect::<HashMap<_, _>>());
    }

    let response = client.call(&prompt, &generation.overrides()).await?;
    println!("{}", response);
    Ok(())
}
