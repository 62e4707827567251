//! Environment check command.

use console::style;

use pdfharvest::extract::check_tools;
use pdfharvest::Config;

/// Report external tools, credentials, and which config file is in use.
pub async fn cmd_check(config: &Config) -> anyhow::Result<()> {
    println!("{}", style("External tools").bold());
    let tools = check_tools();
    for (tool, available) in &tools {
        if *available {
            println!("  {} {}", style("✓").green(), tool);
        } else {
            println!("  {} {} (install poppler-utils)", style("✗").red(), tool);
        }
    }

    println!();
    println!("{}", style("LLM").bold());
    let has_key = config
        .llm
        .api_key
        .as_deref()
        .is_some_and(|k| !k.trim().is_empty());
    if has_key {
        println!("  {} API key configured", style("✓").green());
    } else {
        println!(
            "  {} No API key (set OPENAI_API_KEY or [llm].api_key); enrichment unavailable",
            style("✗").red()
        );
    }
    println!("  Endpoint: {}", config.llm.endpoint);
    println!("  Model:    {}", config.llm.model);

    println!();
    println!("{}", style("Config").bold());
    match config.source_path {
        Some(ref path) => println!("  Loaded from {}", path.display()),
        None => println!("  {}", style("No config file found, using defaults").dim()),
    }

    if tools.iter().any(|(_, ok)| !ok) {
        anyhow::bail!("required tools are missing");
    }
    Ok(())
}
