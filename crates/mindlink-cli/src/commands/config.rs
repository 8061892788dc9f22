//! Configuration display

use anyhow::Result;
use mindlink_core::Config;

/// Print the resolved configuration (API key redacted)
pub fn cmd_config(config: &Config) -> Result<()> {
    print!("{}", render_config(config));
    Ok(())
}

pub fn render_config(config: &Config) -> String {
    let source = config
        .source
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(built-in defaults)".to_string());
    let store_path = config
        .store
        .resolved_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|e| format!("(unavailable: {})", e));
    let api_key = if config.ai.api_key.is_some() {
        "(set)"
    } else {
        "(not set)"
    };

    format!(
        "Config source: {}\n\n\
         [store]\n  backend = {}\n  path    = {}\n\n\
         [ai]\n  backend = {}\n  host    = {}\n  model   = {}\n  api_key = {}\n  timeout = {}s\n\n\
         [pipeline]\n  strategy = {}\n",
        source,
        config.store.backend.as_str(),
        store_path,
        config.ai.backend.as_str(),
        config.ai.host,
        config.ai.model,
        api_key,
        config.ai.timeout.as_secs(),
        config.pipeline.strategy.as_str(),
    )
}
