//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `ai` - Generation backend check
//! - `config` - Show the resolved configuration
//! - `entries` - Diary entry commands (list, add, stats)
//! - `insights` - Run the insight pipeline
//! - `prompts` - Prompt library management commands

pub mod ai;
pub mod config;
pub mod entries;
pub mod insights;
pub mod prompts;

// Re-export command functions for main.rs
pub use ai::*;
pub use config::*;
pub use entries::*;
pub use insights::*;
pub use prompts::*;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use mindlink_core::store::{open_store, EntryStore};
use mindlink_core::Config;

/// Resolve configuration: file layers, then `MINDLINK_*` env, then CLI flags
pub fn load_config(config_path: Option<&Path>, store_path: Option<&Path>) -> Result<Config> {
    let mut config = Config::load(config_path).context("Failed to load configuration")?;
    if let Some(path) = store_path {
        config.store.path = Some(path.to_path_buf());
    }
    Ok(config)
}

/// Open the entry store selected by configuration
pub fn open_entry_store(config: &Config) -> Result<Arc<dyn EntryStore>> {
    open_store(&config.store).context("Failed to open entry store")
}

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
