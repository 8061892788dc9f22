//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// MindLink - journaling insights for reflection and therapy sessions
#[derive(Parser)]
#[command(name = "mindlink")]
#[command(about = "Turn diary entries into a session brief", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to the data dir override, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Entry store location (directory for `files`, JSON file for `kv`)
    #[arg(long, global = true)]
    pub store_path: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate insights and a session brief from all entries
    Insights {
        /// Extractor scheduling: sequential or concurrent (overrides config)
        #[arg(short, long)]
        strategy: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diary entry commands
    Entries {
        #[command(subcommand)]
        action: Option<EntriesAction>,
    },

    /// Prompt library commands
    Prompts {
        #[command(subcommand)]
        action: Option<PromptsAction>,
    },

    /// Generation backend commands
    Ai {
        #[command(subcommand)]
        action: AiAction,
    },

    /// Show the resolved configuration
    Config,
}

#[derive(Subcommand)]
pub enum EntriesAction {
    /// List recent entries
    List {
        /// Number of entries to show (most recent first)
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Write a new entry dated today
    Add {
        /// Entry text
        #[arg(short, long)]
        text: String,

        /// Mood score 1-10
        #[arg(short, long)]
        mood: Option<u8>,

        /// Tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// The journaling prompt this entry answers
        #[arg(short, long)]
        prompt: Option<String>,
    },

    /// Mood trajectory and tag counts (no model calls)
    Stats,
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// List all available prompts and their override status
    List,

    /// Show the content of a specific prompt
    Show {
        /// Prompt ID (e.g., extract_themes, session_brief)
        prompt_id: String,
    },

    /// Show the path where prompt overrides should be placed
    Path,
}

#[derive(Subcommand)]
pub enum AiAction {
    /// Check the backend is reachable and run one sample generation
    Test {
        /// Prompt to send instead of the built-in sample
        #[arg(short, long)]
        prompt: Option<String>,
    },
}
