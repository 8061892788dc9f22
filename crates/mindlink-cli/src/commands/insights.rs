//! Insight pipeline command

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result};
use mindlink_core::insights::{
    InsightEngine, InsightOutcome, InsightReport, PipelineOptions, FAILED_MESSAGE,
    NO_DATA_MESSAGE,
};
use mindlink_core::store::EntryStore;
use mindlink_core::{AIBackend, AIClient, Config, ExecutionStrategy, PromptLibrary};

use super::open_entry_store;

/// Run the pipeline with the configured store and backend
pub async fn cmd_insights(config: &Config, strategy: Option<&str>, json: bool) -> Result<()> {
    let mut options = PipelineOptions::from_config(config);
    if let Some(s) = strategy {
        options.strategy = s
            .parse::<ExecutionStrategy>()
            .context("Invalid --strategy")?;
    }

    let store = open_entry_store(config)?;
    let ai = AIClient::from_config(&config.ai);
    let output = run_insights(store, ai, &mut PromptLibrary::new(), options, json).await?;
    println!("{}", output);
    Ok(())
}

/// Run the pipeline and render its outcome
///
/// A failed run becomes an error carrying the user-facing failure message.
pub async fn run_insights(
    store: Arc<dyn EntryStore>,
    ai: AIClient,
    prompts: &mut PromptLibrary,
    options: PipelineOptions,
    json: bool,
) -> Result<String> {
    tracing::info!(
        store = %store.describe(),
        backend = ai.kind().as_str(),
        model = ai.model(),
        strategy = options.strategy.as_str(),
        "Generating insights"
    );

    let engine = InsightEngine::new(store, ai, prompts, options).context("Failed to load prompts")?;
    let outcome = engine.run().await.context(FAILED_MESSAGE)?;
    render_outcome(&outcome, json)
}

pub fn render_outcome(outcome: &InsightOutcome, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(outcome)?);
    }
    Ok(match outcome {
        InsightOutcome::NoData => NO_DATA_MESSAGE.to_string(),
        InsightOutcome::Report(report) => render_report(report),
    })
}

/// Plain-text report, brief first
pub fn render_report(report: &InsightReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "📋 Session Brief\n");
    let _ = writeln!(out, "{}\n", report.session_brief);

    let _ = writeln!(out, "💬 Critical Quote\n");
    let _ = writeln!(out, "  \"{}\"\n", report.critical_quote);

    let _ = writeln!(out, "📈 Mood Trajectory\n");
    for point in &report.mood_trajectory {
        match point.mood {
            Some(mood) => {
                let _ = writeln!(out, "  {}: {}/10", point.date, mood);
            }
            None => {
                let _ = writeln!(out, "  {}: -", point.date);
            }
        }
    }
    out.push('\n');

    let _ = writeln!(out, "🏷️  Tag Frequency\n");
    if report.tag_frequency.is_empty() {
        let _ = writeln!(out, "  (no tags)");
    }
    for (tag, count) in &report.tag_frequency {
        let _ = writeln!(out, "  #{}: {} times", tag, count);
    }
    out.push('\n');

    let _ = writeln!(out, "🔁 Recurring Themes\n");
    for theme in &report.themes {
        let _ = writeln!(out, "  • {}", theme);
    }
    out.push('\n');

    let _ = writeln!(out, "🌧️  Low Mood Stressors\n");
    let _ = writeln!(out, "{}\n", report.correlations);

    let _ = write!(
        out,
        "Based on {} {} · generated {}",
        report.entry_count,
        if report.entry_count == 1 { "entry" } else { "entries" },
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    out
}
