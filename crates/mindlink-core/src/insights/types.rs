//! Core types for the insight pipeline

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::{MoodPoint, TagFrequency};

/// Shown when there are no entries to analyze
pub const NO_DATA_MESSAGE: &str = "Not enough data to generate insights. Keep journaling!";

/// Shown when the pipeline fails
pub const FAILED_MESSAGE: &str = "Failed to generate insights.";

pub const THEMES_FALLBACK: &str = "Could not determine themes.";
pub const QUOTE_FALLBACK: &str = "Could not extract a critical quote.";
pub const CORRELATIONS_FALLBACK: &str = "Could not determine low mood stressors.";

/// Correlations value when no entry is a low-mood day
pub const NO_LOW_MOOD: &str = "No low mood days recorded.";

/// How the three extractors are scheduled
///
/// Both strategies produce the same report; concurrent only overlaps the
/// network waits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStrategy {
    #[default]
    Sequential,
    Concurrent,
}

impl ExecutionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Concurrent => "concurrent",
        }
    }
}

impl fmt::Display for ExecutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExecutionStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "concurrent" | "parallel" => Ok(Self::Concurrent),
            other => Err(Error::Config(format!("unknown pipeline strategy: {}", other))),
        }
    }
}

/// Pipeline states
///
/// `NoData`, `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    LoadingEntries,
    NoData,
    Aggregating,
    ExtractingThemes,
    ExtractingCorrelations,
    ExtractingQuote,
    Synthesizing,
    Done,
    Failed,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::LoadingEntries => "loading_entries",
            Self::NoData => "no_data",
            Self::Aggregating => "aggregating",
            Self::ExtractingThemes => "extracting_themes",
            Self::ExtractingCorrelations => "extracting_correlations",
            Self::ExtractingQuote => "extracting_quote",
            Self::Synthesizing => "synthesizing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::NoData | Self::Done | Self::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Composite report produced by one pipeline run
///
/// Built fresh on every run and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightReport {
    pub mood_trajectory: Vec<MoodPoint>,
    pub tag_frequency: TagFrequency,
    pub themes: Vec<String>,
    pub correlations: String,
    pub critical_quote: String,
    pub session_brief: String,
    /// Number of entries the report was built from
    pub entry_count: usize,
    pub generated_at: DateTime<Utc>,
}

/// Successful pipeline result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InsightOutcome {
    /// The store held no entries; no model was called
    NoData,
    Report(InsightReport),
}

impl InsightOutcome {
    pub fn report(&self) -> Option<&InsightReport> {
        match self {
            Self::Report(report) => Some(report),
            Self::NoData => None,
        }
    }

    /// Terminal state this outcome corresponds to
    pub fn state(&self) -> PipelineState {
        match self {
            Self::NoData => PipelineState::NoData,
            Self::Report(_) => PipelineState::Done,
        }
    }
}
