//! Generation backend command implementations

use std::time::Duration;

use anyhow::Result;
use mindlink_core::{generate_bounded, health_check_bounded, AIBackend, AIClient, Config};

const SAMPLE_SYSTEM: &str = "You are a supportive journaling companion.";
const SAMPLE_PROMPT: &str =
    "In one short sentence, encourage someone who has just written their first diary entry.";

/// Test the configured generation backend
pub async fn cmd_ai_test(config: &Config, prompt: Option<&str>) -> Result<()> {
    println!("🔍 Testing generation backend...\n");
    println!("  Backend: {}", config.ai.backend.as_str());
    println!("  Host:    {}", config.ai.host);
    println!("  Model:   {}", config.ai.model);
    println!("  Timeout: {}s\n", config.ai.timeout.as_secs());

    let client = AIClient::from_config(&config.ai);
    check_backend(&client, prompt.unwrap_or(SAMPLE_PROMPT), config.ai.timeout).await
}

/// Health check plus one sample generation
///
/// Failures are reported, not returned: this is a diagnostic.
pub async fn check_backend(client: &AIClient, prompt: &str, timeout: Duration) -> Result<()> {
    print!("Checking availability... ");
    if health_check_bounded(client, timeout).await {
        println!("✅ Reachable");
    } else {
        println!("❌ Unreachable");
        println!("\n⚠️  Could not reach {}", client.host());
        println!("\nCheck ai.host in your config or set MINDLINK_AI_HOST.");
        return Ok(());
    }

    println!("\n📝 Sample generation:\n");
    match generate_bounded(client, prompt, SAMPLE_SYSTEM, timeout).await {
        Ok(reply) if reply.is_empty() => println!("  ⚠️  Empty reply"),
        Ok(reply) => println!("  {}", reply),
        Err(e) => println!("  ❌ Error: {}", e),
    }

    Ok(())
}
