//! Insight Engine - runs the pipeline state machine
//!
//! ```text
//! Idle -> LoadingEntries -> NoData
//!                        -> Aggregating -> ExtractingThemes -> ExtractingCorrelations
//!                           -> ExtractingQuote -> Synthesizing -> Done
//! (store or brief error)  -> Failed
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::aggregate::{joined_responses, low_mood_text, mood_trajectory, tag_frequency};
use crate::ai::AIClient;
use crate::config::Config;
use crate::error::Result;
use crate::prompts::PromptLibrary;
use crate::store::EntryStore;

use super::brief::{synthesize, BriefInput};
use super::extractors::{Extractors, PromptSet};
use super::types::{ExecutionStrategy, InsightOutcome, InsightReport, PipelineState};

/// Receives every state the pipeline enters
pub type StateObserver = Arc<dyn Fn(PipelineState) + Send + Sync>;

/// Per-run knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub strategy: ExecutionStrategy,
    /// Upper bound on each model call
    pub call_timeout: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            strategy: ExecutionStrategy::Sequential,
            call_timeout: Duration::from_secs(crate::config::DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            strategy: config.pipeline.strategy,
            call_timeout: config.ai.timeout,
        }
    }
}

/// The insight pipeline
///
/// Holds no state between runs; every `run` reads the store afresh.
pub struct InsightEngine {
    store: Arc<dyn EntryStore>,
    ai: AIClient,
    prompts: PromptSet,
    options: PipelineOptions,
    observer: Option<StateObserver>,
}

impl InsightEngine {
    /// Create an engine, loading all prompt templates
    pub fn new(
        store: Arc<dyn EntryStore>,
        ai: AIClient,
        prompts: &mut PromptLibrary,
        options: PipelineOptions,
    ) -> Result<Self> {
        Ok(Self {
            store,
            ai,
            prompts: PromptSet::load(prompts)?,
            options,
            observer: None,
        })
    }

    /// Report state transitions to `observer`
    pub fn with_observer(mut self, observer: impl Fn(PipelineState) + Send + Sync + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn options(&self) -> PipelineOptions {
        self.options
    }

    fn enter(&self, state: PipelineState) {
        debug!(state = state.as_str(), "Insight pipeline state");
        if let Some(ref observer) = self.observer {
            observer(state);
        }
    }

    /// Run the pipeline once
    ///
    /// `Ok(NoData)` when the store is empty. An `Err` is the `Failed` state:
    /// only a store failure or a failed brief call gets here.
    pub async fn run(&self) -> Result<InsightOutcome> {
        self.enter(PipelineState::Idle);
        match self.execute().await {
            Ok(outcome) => {
                self.enter(outcome.state());
                Ok(outcome)
            }
            Err(e) => {
                warn!(error = %e, "Insight pipeline failed");
                self.enter(PipelineState::Failed);
                Err(e)
            }
        }
    }

    async fn execute(&self) -> Result<InsightOutcome> {
        self.enter(PipelineState::LoadingEntries);
        let entries = self.store.list_entries().await?;
        if entries.is_empty() {
            info!(store = %self.store.describe(), "No diary entries, nothing to analyze");
            return Ok(InsightOutcome::NoData);
        }

        self.enter(PipelineState::Aggregating);
        let trajectory = mood_trajectory(&entries);
        let tags = tag_frequency(&entries);
        let all_text = joined_responses(&entries);
        let low_text = low_mood_text(&entries);
        debug!(
            entries = entries.len(),
            tags = tags.len(),
            low_mood_chars = low_text.len(),
            "Aggregated entries"
        );

        let extractors = Extractors::new(&self.ai, &self.prompts, self.options.call_timeout);

        let themes_step = async {
            self.enter(PipelineState::ExtractingThemes);
            extractors.themes(&all_text).await
        };
        let correlations_step = async {
            self.enter(PipelineState::ExtractingCorrelations);
            extractors.correlations(&low_text).await
        };
        let quote_step = async {
            self.enter(PipelineState::ExtractingQuote);
            extractors.critical_quote(&all_text).await
        };

        let (themes, correlations, critical_quote) = match self.options.strategy {
            ExecutionStrategy::Sequential => {
                let themes = themes_step.await;
                let correlations = correlations_step.await;
                let quote = quote_step.await;
                (themes, correlations, quote)
            }
            ExecutionStrategy::Concurrent => {
                tokio::join!(themes_step, correlations_step, quote_step)
            }
        };

        self.enter(PipelineState::Synthesizing);
        let session_brief = synthesize(
            &extractors,
            &BriefInput {
                mood_data: &trajectory,
                tag_counts: &tags,
                themes: &themes,
                correlations: &correlations,
                critical_quote: &critical_quote,
            },
        )
        .await?;

        info!(
            entries = entries.len(),
            strategy = self.options.strategy.as_str(),
            "Insight report generated"
        );

        Ok(InsightOutcome::Report(InsightReport {
            mood_trajectory: trajectory,
            tag_frequency: tags,
            themes,
            correlations,
            critical_quote,
            session_brief,
            entry_count: entries.len(),
            generated_at: Utc::now(),
        }))
    }
}
