//! Parsing helpers for structured model replies
//!
//! Models often wrap JSON in Markdown code fences. These functions strip the
//! fences and then require the whole reply to have the expected shape; any
//! other reply is a `Parse` error for the caller to absorb.
//!
//! Replies can quote journal text, so errors carry only the reply length.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(r"```[a-zA-Z]*|```").expect("valid regex"))
}

/// Describe a JSON error by position only; serde's message can echo values
fn json_error(e: &serde_json::Error) -> String {
    format!("{:?} error at line {} column {}", e.classify(), e.line(), e.column())
}

/// Remove every Markdown code-fence marker and trim the result
pub fn strip_code_fences(text: &str) -> String {
    fence_regex().replace_all(text, "").trim().to_string()
}

/// Parse a theme list reply: a JSON array of strings
pub fn parse_theme_list(reply: &str) -> Result<Vec<String>> {
    let cleaned = strip_code_fences(reply);
    let value: Value = serde_json::from_str(&cleaned).map_err(|e| {
        debug!(raw = %cleaned, "Unparseable theme reply");
        Error::Parse(format!("Invalid theme JSON: {} ({} chars)", json_error(&e), cleaned.len()))
    })?;

    let items = value.as_array().ok_or_else(|| {
        Error::Parse(format!("Themes are not a JSON array ({} chars)", cleaned.len()))
    })?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_str()
                .map(|s| s.trim().to_string())
                .ok_or_else(|| Error::Parse(format!("Theme {} is not a string", i)))
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    quote: String,
}

/// Parse a critical quote reply: a JSON object with a string `quote`
pub fn parse_quote(reply: &str) -> Result<String> {
    let cleaned = strip_code_fences(reply);
    let parsed: QuoteResponse = serde_json::from_str(&cleaned).map_err(|e| {
        debug!(raw = %cleaned, "Unparseable quote reply");
        Error::Parse(format!("Invalid quote JSON: {} ({} chars)", json_error(&e), cleaned.len()))
    })?;
    Ok(parsed.quote)
}
