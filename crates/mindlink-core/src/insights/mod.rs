//! Insight Engine - session briefs from diary entries
//!
//! One run reads every entry, aggregates mood and tags, asks a generation
//! backend for themes, low-mood stressors and a critical quote, and then
//! synthesizes a brief for the clinician.
//!
//! ## Failure model
//!
//! - **Extractors** absorb their own failures into fixed fallback values
//! - **Brief synthesis** and **entry loading** failures end the run
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mindlink_core::insights::{InsightEngine, PipelineOptions};
//!
//! let engine = InsightEngine::new(store, ai, &mut PromptLibrary::new(), options)?;
//! match engine.run().await? {
//!     InsightOutcome::NoData => println!("{}", NO_DATA_MESSAGE),
//!     InsightOutcome::Report(report) => println!("{}", report.session_brief),
//! }
//! ```

pub mod brief;
pub mod engine;
pub mod extractors;
pub mod types;

pub use brief::{synthesize, BriefInput};
pub use engine::{InsightEngine, PipelineOptions, StateObserver};
pub use extractors::{Extractors, PromptSet, PromptTemplate};
pub use types::{
    ExecutionStrategy, InsightOutcome, InsightReport, PipelineState, CORRELATIONS_FALLBACK,
    FAILED_MESSAGE, NO_DATA_MESSAGE, NO_LOW_MOOD, QUOTE_FALLBACK, THEMES_FALLBACK,
};
