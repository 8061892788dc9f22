//! MindLink CLI - journaling insight engine
//!
//! Usage:
//!   mindlink entries add --text "..." --mood 4 --tag school
//!   mindlink entries stats          Mood trajectory and tag counts
//!   mindlink insights               Generate the session brief
//!   mindlink ai test                Check the generation backend

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = commands::load_config(cli.config.as_deref(), cli.store_path.as_deref())?;

    match cli.command {
        Commands::Insights { strategy, json } => {
            commands::cmd_insights(&config, strategy.as_deref(), json).await
        }
        Commands::Entries { action } => {
            let store = commands::open_entry_store(&config)?;
            match action {
                None => commands::cmd_entries_list(store.as_ref(), 20).await,
                Some(EntriesAction::List { limit }) => {
                    commands::cmd_entries_list(store.as_ref(), limit).await
                }
                Some(EntriesAction::Add {
                    text,
                    mood,
                    tags,
                    prompt,
                }) => commands::cmd_entries_add(store.as_ref(), text, mood, tags, prompt).await,
                Some(EntriesAction::Stats) => commands::cmd_entries_stats(store.as_ref()).await,
            }
        }
        Commands::Prompts { action } => match action {
            None | Some(PromptsAction::List) => commands::cmd_prompts_list(),
            Some(PromptsAction::Show { prompt_id }) => commands::cmd_prompts_show(&prompt_id),
            Some(PromptsAction::Path) => commands::cmd_prompts_path(),
        },
        Commands::Ai { action } => match action {
            AiAction::Test { prompt } => commands::cmd_ai_test(&config, prompt.as_deref()).await,
        },
        Commands::Config => commands::cmd_config(&config),
    }
}
