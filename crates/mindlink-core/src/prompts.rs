//! Prompt library for the insight pipeline
//!
//! Prompts are loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/mindlink/prompts/overrides/)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Each prompt file carries YAML frontmatter followed by a `# System` section
//! (the role instruction) and a `# User` section (the template).

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default prompts (compiled into binary)
mod defaults {
    pub const EXTRACT_THEMES: &str = include_str!("../../../prompts/extract_themes.md");
    pub const EXTRACT_CORRELATIONS: &str =
        include_str!("../../../prompts/extract_correlations.md");
    pub const EXTRACT_CRITICAL_QUOTE: &str =
        include_str!("../../../prompts/extract_critical_quote.md");
    pub const SESSION_BRIEF: &str = include_str!("../../../prompts/session_brief.md");
}

/// Known prompt IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    /// Recurring emotional themes as a JSON array
    ExtractThemes,
    /// Stressors mentioned on low-mood days
    ExtractCorrelations,
    /// One verbatim sentence as `{"quote": ...}`
    ExtractCriticalQuote,
    /// Final narrative brief
    SessionBrief,
}

impl PromptId {
    /// Get the string identifier for this prompt
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExtractThemes => "extract_themes",
            Self::ExtractCorrelations => "extract_correlations",
            Self::ExtractCriticalQuote => "extract_critical_quote",
            Self::SessionBrief => "session_brief",
        }
    }

    /// Get all known prompt IDs
    pub fn all() -> &'static [PromptId] {
        &[
            Self::ExtractThemes,
            Self::ExtractCorrelations,
            Self::ExtractCriticalQuote,
            Self::SessionBrief,
        ]
    }

    /// Look up a prompt by its string identifier
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|id| id.as_str() == name)
    }

    fn default_content(&self) -> &'static str {
        match self {
            Self::ExtractThemes => defaults::EXTRACT_THEMES,
            Self::ExtractCorrelations => defaults::EXTRACT_CORRELATIONS,
            Self::ExtractCriticalQuote => defaults::EXTRACT_CRITICAL_QUOTE,
            Self::SessionBrief => defaults::SESSION_BRIEF,
        }
    }
}

/// Prompt frontmatter metadata
#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    /// Unique identifier
    pub id: String,
    /// Version number for tracking changes
    pub version: u32,
}

/// A loaded prompt with metadata and content
#[derive(Debug, Clone)]
pub struct Prompt {
    pub metadata: PromptMetadata,
    /// The prompt body (system + user sections)
    pub content: String,
    pub is_override: bool,
    pub override_path: Option<PathBuf>,
}

impl Prompt {
    /// The role instruction sent alongside the prompt
    pub fn system_section(&self) -> Option<&str> {
        extract_section(&self.content, "# System")
    }

    pub fn user_section(&self) -> Option<&str> {
        extract_section(&self.content, "# User")
    }

    /// Render the user section with `{{var}}` placeholders filled in
    ///
    /// Falls back to the whole body when there is no `# User` section.
    pub fn render_user(&self, vars: &HashMap<&str, &str>) -> String {
        let template = self.user_section().unwrap_or(&self.content);
        substitute(template, vars)
    }
}

/// Prompt library for loading and caching prompts
pub struct PromptLibrary {
    override_dir: Option<PathBuf>,
    cache: HashMap<PromptId, Prompt>,
}

impl PromptLibrary {
    /// Create a new prompt library with default paths
    pub fn new() -> Self {
        Self {
            override_dir: default_prompts_dir(),
            cache: HashMap::new(),
        }
    }

    /// Create a prompt library with a custom override directory
    pub fn with_override_dir(path: PathBuf) -> Self {
        Self {
            override_dir: Some(path),
            cache: HashMap::new(),
        }
    }

    /// Create a prompt library with no override directory (embedded only)
    pub fn embedded_only() -> Self {
        Self {
            override_dir: None,
            cache: HashMap::new(),
        }
    }

    /// Get a prompt by ID, loading from override or default
    pub fn get(&mut self, id: PromptId) -> Result<&Prompt> {
        if !self.cache.contains_key(&id) {
            let prompt = self.load(id)?;
            self.cache.insert(id, prompt);
        }
        self.cache
            .get(&id)
            .ok_or_else(|| Error::Prompt(format!("prompt {} not cached", id.as_str())))
    }

    fn load(&self, id: PromptId) -> Result<Prompt> {
        if let Some(ref override_dir) = self.override_dir {
            let override_path = override_dir.join(format!("{}.md", id.as_str()));
            if override_path.exists() {
                let content = fs::read_to_string(&override_path).map_err(|e| {
                    Error::Prompt(format!("failed to read prompt override: {}", e))
                })?;
                let (metadata, body) = parse_prompt(&content)?;
                check_sections(id, &body)?;
                return Ok(Prompt {
                    metadata,
                    content: body,
                    is_override: true,
                    override_path: Some(override_path),
                });
            }
        }

        let (metadata, body) = parse_prompt(id.default_content())?;
        Ok(Prompt {
            metadata,
            content: body,
            is_override: false,
            override_path: None,
        })
    }

    /// List all prompts with their override status
    pub fn list(&mut self) -> Vec<PromptInfo> {
        PromptId::all()
            .iter()
            .map(|&id| {
                let has_override = self.has_override(id);
                let override_path = if has_override {
                    self.override_dir
                        .as_ref()
                        .map(|d| d.join(format!("{}.md", id.as_str())))
                } else {
                    None
                };
                let version = self.get(id).map(|p| p.metadata.version).unwrap_or(0);
                PromptInfo {
                    id: id.as_str().to_string(),
                    version,
                    has_override,
                    override_path,
                }
            })
            .collect()
    }

    /// Check if a prompt has an override file
    pub fn has_override(&self, id: PromptId) -> bool {
        self.override_dir
            .as_ref()
            .is_some_and(|d| d.join(format!("{}.md", id.as_str())).exists())
    }

    pub fn override_dir(&self) -> Option<&PathBuf> {
        self.override_dir.as_ref()
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Information about a prompt for listing
#[derive(Debug, Clone)]
pub struct PromptInfo {
    pub id: String,
    pub version: u32,
    pub has_override: bool,
    pub override_path: Option<PathBuf>,
}

/// Default prompts override directory
pub fn default_prompts_dir() -> Option<PathBuf> {
    crate::config::data_dir().map(|d| d.join("prompts").join("overrides"))
}

/// Parse a prompt file into metadata and body
fn parse_prompt(content: &str) -> Result<(PromptMetadata, String)> {
    let content = content.trim();

    let rest = content
        .strip_prefix("---")
        .ok_or_else(|| Error::Prompt("prompt must start with YAML frontmatter (---)".into()))?;

    let end = rest.find("---").ok_or_else(|| {
        Error::Prompt("prompt frontmatter not closed (missing second ---)".into())
    })?;

    let frontmatter = rest[..end].trim();
    let body = rest[end + 3..].trim();

    let metadata: PromptMetadata = serde_yaml::from_str(frontmatter)
        .map_err(|e| Error::Prompt(format!("invalid prompt frontmatter: {}", e)))?;

    Ok((metadata, body.to_string()))
}

/// Overrides must keep the role instruction, or the call loses its persona
fn check_sections(id: PromptId, body: &str) -> Result<()> {
    if extract_section(body, "# System").is_none() {
        return Err(Error::Prompt(format!(
            "override for {} has no # System section",
            id.as_str()
        )));
    }
    Ok(())
}

/// Extract a section from the prompt content
fn extract_section<'a>(content: &'a str, header: &str) -> Option<&'a str> {
    let start = content.find(header)?;
    let after_header = &content[start + header.len()..];
    let end = after_header.find("\n# ").unwrap_or(after_header.len());
    Some(after_header[..end].trim())
}

/// Replace `{{name}}` placeholders in one pass
///
/// Substituted values are copied verbatim, so a journal entry that happens to
/// contain `{{data}}` is never expanded a second time. Unknown placeholders
/// are left as-is.
fn substitute(template: &str, vars: &HashMap<&str, &str>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        match after_open.find("}}") {
            Some(close) => {
                let name = after_open[..close].trim();
                match vars.get(name) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&rest[open..open + 2 + close + 2]),
                }
                rest = &after_open[close + 2..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prompt() {
        let content = r#"---
id: test_prompt
version: 2
---

# System
Test system prompt.

# User
Test user prompt with {{variable}}.
"#;

        let (metadata, body) = parse_prompt(content).unwrap();
        assert_eq!(metadata.id, "test_prompt");
        assert_eq!(metadata.version, 2);
        assert!(body.contains("# System"));
        assert!(body.contains("# User"));
    }

    #[test]
    fn test_parse_prompt_requires_frontmatter() {
        assert!(parse_prompt("# System\nhello").is_err());
        assert!(parse_prompt("---\nid: x\nversion: 1\n# System").is_err());
    }

    #[test]
    fn test_extract_section() {
        let content = "# System\nSystem content here.\n\n# User\nUser content here.";
        assert_eq!(
            extract_section(content, "# System"),
            Some("System content here.")
        );
        assert_eq!(extract_section(content, "# User"), Some("User content here."));
        assert_eq!(extract_section(content, "# Missing"), None);
    }

    #[test]
    fn test_substitute_single_pass() {
        let mut vars = HashMap::new();
        vars.insert("entries", "I wrote {{data}} in my diary");
        vars.insert("data", "SHOULD NOT APPEAR");
        let out = substitute("Entries:\n{{entries}}", &vars);
        assert_eq!(out, "Entries:\nI wrote {{data}} in my diary");
    }

    #[test]
    fn test_substitute_leaves_unknown_and_unclosed() {
        let vars = HashMap::new();
        assert_eq!(substitute("a {{x}} b", &vars), "a {{x}} b");
        assert_eq!(substitute("a {{x b", &vars), "a {{x b");
    }

    #[test]
    fn test_prompt_library_embedded() {
        let mut lib = PromptLibrary::embedded_only();
        for id in PromptId::all() {
            let prompt = lib.get(*id).unwrap();
            assert!(!prompt.is_override);
            assert_eq!(prompt.metadata.id, id.as_str());
            assert!(prompt.system_section().is_some());
            assert!(prompt.user_section().is_some());
        }
    }

    #[test]
    fn test_embedded_prompt_wording() {
        let mut lib = PromptLibrary::embedded_only();
        let themes = lib.get(PromptId::ExtractThemes).unwrap();
        assert_eq!(
            themes.system_section(),
            Some("You are an expert in thematic analysis.")
        );

        let mut vars = HashMap::new();
        vars.insert("text", "a");
        let correlations = lib.get(PromptId::ExtractCorrelations).unwrap();
        let rendered = correlations.render_user(&vars);
        assert!(rendered.starts_with("The user reported feeling very low"));
        assert!(rendered.ends_with("Text:\na"));
    }

    #[test]
    fn test_override_takes_precedence() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("extract_themes.md"),
            "---\nid: extract_themes\nversion: 9\n---\n\n# System\nCustom role.\n\n# User\nThemes of {{entries}}",
        )
        .unwrap();

        let mut lib = PromptLibrary::with_override_dir(tmp.path().to_path_buf());
        assert!(lib.has_override(PromptId::ExtractThemes));
        assert!(!lib.has_override(PromptId::SessionBrief));

        let prompt = lib.get(PromptId::ExtractThemes).unwrap();
        assert!(prompt.is_override);
        assert_eq!(prompt.metadata.version, 9);
        assert_eq!(prompt.system_section(), Some("Custom role."));

        let infos = lib.list();
        assert_eq!(infos.len(), 4);
        assert!(infos.iter().any(|i| i.id == "extract_themes" && i.has_override));
    }

    #[test]
    fn test_override_without_system_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("session_brief.md"),
            "---\nid: session_brief\nversion: 1\n---\n\n# User\n{{data}}",
        )
        .unwrap();
        let mut lib = PromptLibrary::with_override_dir(tmp.path().to_path_buf());
        assert!(matches!(
            lib.get(PromptId::SessionBrief),
            Err(Error::Prompt(_))
        ));
    }

    #[test]
    fn test_prompt_id_from_name() {
        assert_eq!(
            PromptId::from_name("session_brief"),
            Some(PromptId::SessionBrief)
        );
        assert_eq!(PromptId::from_name("classify_merchant"), None);
        assert_eq!(PromptId::all().len(), 4);
    }
}
