//! MindLink Core Library
//!
//! Shared functionality for the MindLink journaling tool:
//! - Diary entry storage (per-file and key-value backends)
//! - Mood and tag aggregation
//! - Pluggable text-generation backends (chat proxy, OpenAI-compatible, Ollama)
//! - Prompt library for customizable prompts
//! - Insight pipeline producing session briefs
//! - Crisis language detection

pub mod aggregate;
pub mod ai;
pub mod config;
pub mod error;
pub mod insights;
pub mod models;
pub mod prompts;
pub mod safety;
pub mod store;

/// Test utilities including mock chat proxy server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{
    generate_bounded, health_check_bounded, AIBackend, AIClient, GeminiProxyBackend, MockBackend,
    MockCall, OllamaBackend, OpenAICompatibleBackend,
};
pub use config::{AiBackendKind, AiConfig, Config, PipelineConfig, StoreBackend, StoreConfig};
pub use error::{Error, Result};
pub use insights::{
    ExecutionStrategy, InsightEngine, InsightOutcome, InsightReport, PipelineOptions,
    PipelineState,
};
pub use models::{DiaryEntry, MoodPoint, NewEntry, TagFrequency};
pub use prompts::{Prompt, PromptId, PromptInfo, PromptLibrary};
pub use store::{open_store, EntryStore, FileEntryStore, KeyValueEntryStore, MemoryEntryStore};
