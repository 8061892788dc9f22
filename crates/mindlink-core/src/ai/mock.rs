//! Mock backend for testing
//!
//! Returns predictable replies without a running model server. Replies can be
//! scripted per prompt, failures and delays injected, and every call is
//! recorded so tests can assert how many model calls an operation made.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::AIBackend;

/// A recorded call to the mock backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub prompt: String,
    pub system_instruction: String,
}

#[derive(Debug, Clone)]
enum MockOutcome {
    Reply(String),
    Fail(String),
}

#[derive(Debug, Clone)]
struct MockRule {
    /// Matched against the role instruction only
    pattern: String,
    outcome: MockOutcome,
}

/// Mock AI backend for testing
///
/// Clones share the call log.
#[derive(Debug, Clone)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    rules: Vec<MockRule>,
    default_reply: Option<String>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            rules: Vec::new(),
            default_reply: None,
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    /// Reply with `reply` when the role instruction contains `pattern`
    ///
    /// Rules are checked in the order they were added. The prompt body is not
    /// matched, since it can carry earlier replies and fallback text.
    pub fn with_reply(mut self, pattern: &str, reply: &str) -> Self {
        self.rules.push(MockRule {
            pattern: pattern.to_string(),
            outcome: MockOutcome::Reply(reply.to_string()),
        });
        self
    }

    /// Fail with a generation error when the role instruction contains `pattern`
    pub fn with_failure(mut self, pattern: &str, message: &str) -> Self {
        self.rules.push(MockRule {
            pattern: pattern.to_string(),
            outcome: MockOutcome::Fail(message.to_string()),
        });
        self
    }

    /// Reply used when no rule matches (instead of the canned replies)
    pub fn with_default_reply(mut self, reply: &str) -> Self {
        self.default_reply = Some(reply.to_string());
        self
    }

    /// Sleep before answering every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// All calls made so far, in order
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Calls whose role instruction contains `needle`
    pub fn calls_matching(&self, needle: &str) -> Vec<MockCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.system_instruction.contains(needle))
            .collect()
    }

    fn record(&self, prompt: &str, system_instruction: &str) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(MockCall {
                prompt: prompt.to_string(),
                system_instruction: system_instruction.to_string(),
            });
        }
    }
}

/// Canned replies keyed on the role instruction of each insight prompt
pub(crate) fn canned_reply(system_instruction: &str) -> &'static str {
    let s = system_instruction.to_lowercase();
    if s.contains("thematic") {
        r#"["Exam-related stress", "Conflict with family", "Trouble sleeping"]"#
    } else if s.contains("stressors") {
        "- Upcoming exams\n- Arguments at home"
    } else if s.contains("quotes") {
        r#"{"quote": "I feel like nobody listens to me."}"#
    } else if s.contains("clinical assistant") {
        "**Mood trajectory:** low early in the week, recovering later.\n\n\
         **Suggested questions:**\n1. What has school felt like lately?\n2. Who do you talk to when things are hard?"
    } else {
        "Mock reply."
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn generate(&self, prompt: &str, system_instruction: &str) -> Result<String> {
        self.record(prompt, system_instruction);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let rule = self
            .rules
            .iter()
            .find(|r| system_instruction.contains(&r.pattern));

        match rule.map(|r| &r.outcome) {
            Some(MockOutcome::Reply(reply)) => Ok(reply.trim().to_string()),
            Some(MockOutcome::Fail(message)) => Err(Error::Generation(message.clone())),
            None => Ok(self
                .default_reply
                .as_deref()
                .unwrap_or_else(|| canned_reply(system_instruction))
                .trim()
                .to_string()),
        }
    }

    async fn health_check(&self) -> bool {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
