//! Theme, correlation and quote extractors
//!
//! Each extractor makes at most one model call and never fails: network,
//! timeout and parse errors are logged and replaced with a fixed fallback so
//! the report always renders.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, warn};

use crate::ai::parsing::{parse_quote, parse_theme_list};
use crate::ai::{generate_bounded, AIBackend};
use crate::error::{Error, Result};
use crate::prompts::{Prompt, PromptId, PromptLibrary};

use super::types::{CORRELATIONS_FALLBACK, NO_LOW_MOOD, QUOTE_FALLBACK, THEMES_FALLBACK};

/// A prompt ready to render: role instruction plus user template
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    id: PromptId,
    system: String,
    prompt: Prompt,
}

impl PromptTemplate {
    pub fn load(library: &mut PromptLibrary, id: PromptId) -> Result<Self> {
        let prompt = library.get(id)?.clone();
        let system = prompt
            .system_section()
            .ok_or_else(|| {
                Error::Prompt(format!("prompt {} has no # System section", id.as_str()))
            })?
            .to_string();
        Ok(Self { id, system, prompt })
    }

    pub fn id(&self) -> PromptId {
        self.id
    }

    /// The role instruction
    pub fn system(&self) -> &str {
        &self.system
    }

    /// Render the user template with a single placeholder filled in
    pub fn render(&self, name: &str, value: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert(name, value);
        self.prompt.render_user(&vars)
    }
}

/// The four templates one pipeline run needs
#[derive(Debug, Clone)]
pub struct PromptSet {
    pub themes: PromptTemplate,
    pub correlations: PromptTemplate,
    pub quote: PromptTemplate,
    pub brief: PromptTemplate,
}

impl PromptSet {
    /// Load every template up front so a bad override fails before any call
    pub fn load(library: &mut PromptLibrary) -> Result<Self> {
        Ok(Self {
            themes: PromptTemplate::load(library, PromptId::ExtractThemes)?,
            correlations: PromptTemplate::load(library, PromptId::ExtractCorrelations)?,
            quote: PromptTemplate::load(library, PromptId::ExtractCriticalQuote)?,
            brief: PromptTemplate::load(library, PromptId::SessionBrief)?,
        })
    }
}

/// Everything an extractor call needs
#[derive(Clone, Copy)]
pub struct Extractors<'a> {
    pub ai: &'a dyn AIBackend,
    pub prompts: &'a PromptSet,
    pub timeout: Duration,
}

impl<'a> Extractors<'a> {
    pub fn new(ai: &'a dyn AIBackend, prompts: &'a PromptSet, timeout: Duration) -> Self {
        Self {
            ai,
            prompts,
            timeout,
        }
    }

    async fn call(&self, template: &PromptTemplate, name: &str, value: &str) -> Result<String> {
        let prompt = template.render(name, value);
        debug!(
            prompt = template.id().as_str(),
            chars = value.len(),
            "Calling generation backend"
        );
        generate_bounded(self.ai, &prompt, template.system(), self.timeout).await
    }

    /// Recurring emotional themes across all entry text
    ///
    /// Empty text is still sent.
    pub async fn themes(&self, all_text: &str) -> Vec<String> {
        let reply = match self.call(&self.prompts.themes, "entries", all_text).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, fallback = THEMES_FALLBACK, "Theme extraction failed");
                return vec![THEMES_FALLBACK.to_string()];
            }
        };

        match parse_theme_list(&reply) {
            Ok(themes) => themes,
            Err(e) => {
                warn!(error = %e, fallback = THEMES_FALLBACK, "Theme reply unparseable");
                vec![THEMES_FALLBACK.to_string()]
            }
        }
    }

    /// Stressors mentioned on low-mood days
    ///
    /// Empty text short-circuits without calling the backend.
    pub async fn correlations(&self, low_mood_text: &str) -> String {
        if low_mood_text.is_empty() {
            debug!("No low-mood entries, skipping correlation call");
            return NO_LOW_MOOD.to_string();
        }

        match self
            .call(&self.prompts.correlations, "text", low_mood_text)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, fallback = CORRELATIONS_FALLBACK, "Correlation extraction failed");
                CORRELATIONS_FALLBACK.to_string()
            }
        }
    }

    /// The single most representative sentence, verbatim
    pub async fn critical_quote(&self, all_text: &str) -> String {
        let reply = match self.call(&self.prompts.quote, "entries", all_text).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, fallback = QUOTE_FALLBACK, "Quote extraction failed");
                return QUOTE_FALLBACK.to_string();
            }
        };

        parse_quote(&reply).unwrap_or_else(|e| {
            warn!(error = %e, fallback = QUOTE_FALLBACK, "Quote reply unparseable");
            QUOTE_FALLBACK.to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;

    fn prompts() -> PromptSet {
        PromptSet::load(&mut PromptLibrary::embedded_only()).unwrap()
    }

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn test_prompt_set_loads_system_sections() {
        let set = prompts();
        assert_eq!(set.themes.system(), "You are an expert in thematic analysis.");
        assert_eq!(set.brief.system(), "You are a helpful clinical assistant.");
        assert!(set.correlations.render("text", "a").ends_with("Text:\na"));
    }

    #[tokio::test]
    async fn test_themes_parsed() {
        let mock = MockBackend::new().with_reply("thematic", r#"["Stress", "Sleep"]"#);
        let set = prompts();
        let themes = Extractors::new(&mock, &set, TIMEOUT).themes("text").await;
        assert_eq!(themes, vec!["Stress", "Sleep"]);
    }

    #[tokio::test]
    async fn test_themes_not_json_falls_back() {
        let mock = MockBackend::new().with_reply("thematic", "not json");
        let set = prompts();
        let themes = Extractors::new(&mock, &set, TIMEOUT).themes("text").await;
        assert_eq!(themes, vec![THEMES_FALLBACK.to_string()]);
    }

    #[tokio::test]
    async fn test_themes_network_failure_falls_back() {
        let mock = MockBackend::new().with_failure("thematic", "connection refused");
        let set = prompts();
        let themes = Extractors::new(&mock, &set, TIMEOUT).themes("text").await;
        assert_eq!(themes, vec![THEMES_FALLBACK.to_string()]);
    }

    #[tokio::test]
    async fn test_themes_sends_empty_text() {
        let mock = MockBackend::new();
        let set = prompts();
        Extractors::new(&mock, &set, TIMEOUT).themes("").await;
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_correlations_empty_makes_no_call() {
        let mock = MockBackend::new();
        let set = prompts();
        let result = Extractors::new(&mock, &set, TIMEOUT).correlations("").await;
        assert_eq!(result, NO_LOW_MOOD);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_correlations_reply_verbatim() {
        let mock = MockBackend::new().with_reply("stressors", "  - Exams\n- Family  ");
        let set = prompts();
        let result = Extractors::new(&mock, &set, TIMEOUT)
            .correlations("bad day")
            .await;
        assert_eq!(result, "- Exams\n- Family");
        assert!(mock.calls()[0].prompt.ends_with("Text:\nbad day"));
    }

    #[tokio::test]
    async fn test_correlations_failure_falls_back() {
        let mock = MockBackend::new().with_failure("stressors", "503");
        let set = prompts();
        let result = Extractors::new(&mock, &set, TIMEOUT)
            .correlations("bad day")
            .await;
        assert_eq!(result, CORRELATIONS_FALLBACK);
    }

    #[tokio::test]
    async fn test_quote_fenced_reply() {
        let mock =
            MockBackend::new().with_reply("quotes", "```json\n{\"quote\":\"I feel empty\"}\n```");
        let set = prompts();
        let quote = Extractors::new(&mock, &set, TIMEOUT)
            .critical_quote("I feel empty")
            .await;
        assert_eq!(quote, "I feel empty");
    }

    #[tokio::test]
    async fn test_quote_unparseable_falls_back() {
        let mock = MockBackend::new().with_reply("quotes", "The quote is: I feel empty");
        let set = prompts();
        let quote = Extractors::new(&mock, &set, TIMEOUT).critical_quote("x").await;
        assert_eq!(quote, QUOTE_FALLBACK);
    }

    #[tokio::test]
    async fn test_timeout_is_absorbed() {
        let mock = MockBackend::new().with_delay(Duration::from_millis(200));
        let set = prompts();
        let quote = Extractors::new(&mock, &set, Duration::from_millis(10))
            .critical_quote("x")
            .await;
        assert_eq!(quote, QUOTE_FALLBACK);
    }
}
