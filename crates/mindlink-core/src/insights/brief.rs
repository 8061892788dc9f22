//! Session brief synthesis
//!
//! Unlike the extractors, a failed brief call is returned to the caller.

use serde::Serialize;

use crate::error::Result;
use crate::models::{MoodPoint, TagFrequency};

use super::extractors::Extractors;

/// Structured data handed to the brief prompt
#[derive(Debug, Serialize)]
pub struct BriefInput<'a> {
    pub mood_data: &'a [MoodPoint],
    pub tag_counts: &'a TagFrequency,
    pub themes: &'a [String],
    pub correlations: &'a str,
    pub critical_quote: &'a str,
}

impl BriefInput<'_> {
    /// Pretty JSON placed in the prompt's data block
    pub fn to_prompt_data(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Produce the narrative brief from all derived artifacts
pub async fn synthesize(extractors: &Extractors<'_>, input: &BriefInput<'_>) -> Result<String> {
    let data = input.to_prompt_data()?;
    let template = &extractors.prompts.brief;
    let prompt = template.render("data", &data);
    crate::ai::generate_bounded(extractors.ai, &prompt, template.system(), extractors.timeout).await
}
