//! MindLink configuration
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path, or the override in the data dir
//!    (~/.local/share/mindlink/config/mindlink.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! `MINDLINK_*` environment variables are applied on top of whichever file
//! was used.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::insights::ExecutionStrategy;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/mindlink.toml");

/// Default per-call timeout for generation requests
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Which entry store implementation to open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// One JSON file per entry in a directory
    Files,
    /// A single key-value JSON file
    KeyValue,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Files => "files",
            Self::KeyValue => "kv",
        }
    }
}

impl FromStr for StoreBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "files" | "file" | "fs" => Ok(Self::Files),
            "kv" | "keyvalue" | "key_value" | "local_storage" => Ok(Self::KeyValue),
            other => Err(Error::Config(format!("unknown store backend: {}", other))),
        }
    }
}

/// Which generation backend to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiBackendKind {
    /// Chat proxy speaking the `contents` + `systemInstruction` format
    GeminiProxy,
    /// Any `/v1/chat/completions` server
    OpenAICompatible,
    /// Ollama `/api/generate`
    Ollama,
    /// Canned replies, no network
    Mock,
}

impl AiBackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GeminiProxy => "gemini_proxy",
            Self::OpenAICompatible => "openai_compatible",
            Self::Ollama => "ollama",
            Self::Mock => "mock",
        }
    }
}

impl FromStr for AiBackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gemini_proxy" | "gemini" | "proxy" => Ok(Self::GeminiProxy),
            "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp" => {
                Ok(Self::OpenAICompatible)
            }
            "ollama" => Ok(Self::Ollama),
            "mock" => Ok(Self::Mock),
            other => Err(Error::Config(format!("unknown AI backend: {}", other))),
        }
    }
}

/// Entry store settings
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Directory (files) or file (kv); defaults under the data dir
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    /// The configured path, or the platform default for the backend
    pub fn resolved_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.path {
            return Ok(path.clone());
        }
        let base = data_dir().ok_or_else(|| {
            Error::Config("no data directory available; set store.path".into())
        })?;
        Ok(match self.backend {
            StoreBackend::Files => base.join("entries"),
            StoreBackend::KeyValue => base.join("entries.json"),
        })
    }
}

/// Generation backend settings
#[derive(Clone)]
pub struct AiConfig {
    pub backend: AiBackendKind,
    pub host: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiConfig")
            .field("backend", &self.backend)
            .field("host", &self.host)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Pipeline settings
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub strategy: ExecutionStrategy,
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreConfig,
    pub ai: AiConfig,
    pub pipeline: PipelineConfig,
    /// File the config was read from (`None` = embedded defaults)
    pub source: Option<PathBuf>,
}

impl Config {
    /// Load config (explicit path, then data dir override, then defaults)
    /// and apply environment overrides
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = load_file(explicit)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Embedded defaults only
    pub fn defaults() -> Result<Self> {
        parse_config(DEFAULT_CONFIG, None)
    }

    /// Apply `MINDLINK_*` overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("MINDLINK_STORE_BACKEND") {
            self.store.backend = v.parse()?;
        }
        if let Some(v) = lookup("MINDLINK_STORE_PATH") {
            self.store.path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("MINDLINK_AI_BACKEND") {
            self.ai.backend = v.parse()?;
        }
        if let Some(v) = lookup("MINDLINK_AI_HOST") {
            self.ai.host = v;
        }
        if let Some(v) = lookup("MINDLINK_AI_MODEL") {
            self.ai.model = v;
        }
        if let Some(v) = lookup("MINDLINK_AI_API_KEY") {
            self.ai.api_key = if v.is_empty() { None } else { Some(v) };
        }
        if let Some(v) = lookup("MINDLINK_AI_TIMEOUT_SECS") {
            let secs: u64 = v
                .parse()
                .map_err(|_| Error::Config(format!("invalid MINDLINK_AI_TIMEOUT_SECS: {}", v)))?;
            self.ai.timeout = timeout_from_secs(secs)?;
        }
        if let Some(v) = lookup("MINDLINK_PIPELINE_STRATEGY") {
            self.pipeline.strategy = v.parse()?;
        }
        Ok(())
    }
}

/// MindLink data directory (~/.local/share/mindlink on Linux)
pub fn data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("mindlink"))
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    data_dir().map(|d| d.join("config").join("mindlink.toml"))
}

fn load_file(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        // An explicit path that does not exist is a mistake, not a fallback
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        return parse_config(&content, Some(path.to_path_buf()));
    }

    if let Some(default_path) = default_config_path() {
        if default_path.exists() {
            let content = fs::read_to_string(&default_path)
                .map_err(|e| Error::Config(format!("failed to read config: {}", e)))?;
            return parse_config(&content, Some(default_path));
        }
    }

    parse_config(DEFAULT_CONFIG, None)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    store: Option<RawStore>,
    ai: Option<RawAi>,
    pipeline: Option<RawPipeline>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStore {
    backend: Option<String>,
    path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAi {
    backend: Option<String>,
    host: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPipeline {
    strategy: Option<String>,
}

fn timeout_from_secs(secs: u64) -> Result<Duration> {
    if secs == 0 {
        return Err(Error::Config("timeout_secs must be greater than 0".into()));
    }
    Ok(Duration::from_secs(secs))
}

/// Parse config from TOML content
fn parse_config(content: &str, source: Option<PathBuf>) -> Result<Config> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("invalid config TOML: {}", e)))?;

    let mut config = Config {
        store: StoreConfig {
            backend: StoreBackend::Files,
            path: None,
        },
        ai: AiConfig {
            backend: AiBackendKind::GeminiProxy,
            host: "http://localhost:8787/api/chat/".to_string(),
            model: "gemini-1.5-flash".to_string(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        },
        pipeline: PipelineConfig {
            strategy: ExecutionStrategy::Sequential,
        },
        source,
    };

    if let Some(store) = raw.store {
        if let Some(backend) = store.backend {
            config.store.backend = backend.parse()?;
        }
        config.store.path = store.path;
    }

    if let Some(ai) = raw.ai {
        if let Some(backend) = ai.backend {
            config.ai.backend = backend.parse()?;
        }
        if let Some(host) = ai.host {
            config.ai.host = host;
        }
        if let Some(model) = ai.model {
            config.ai.model = model;
        }
        config.ai.api_key = ai.api_key.filter(|k| !k.is_empty());
        if let Some(secs) = ai.timeout_secs {
            config.ai.timeout = timeout_from_secs(secs)?;
        }
    }

    if let Some(pipeline) = raw.pipeline {
        if let Some(strategy) = pipeline.strategy {
            config.pipeline.strategy = strategy.parse()?;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_default_config() {
        let config = Config::defaults().unwrap();
        assert_eq!(config.store.backend, StoreBackend::Files);
        assert_eq!(config.ai.backend, AiBackendKind::GeminiProxy);
        assert_eq!(config.ai.timeout, Duration::from_secs(20));
        assert_eq!(config.pipeline.strategy, ExecutionStrategy::Sequential);
        assert!(config.source.is_none());
    }

    #[test]
    fn test_parse_custom_config() {
        let content = r#"
[store]
backend = "kv"
path = "/tmp/storage.json"

[ai]
backend = "ollama"
host = "http://10.0.0.5:11434"
model = "llama3.2"
timeout_secs = 45

[pipeline]
strategy = "concurrent"
"#;
        let config = parse_config(content, None).unwrap();
        assert_eq!(config.store.backend, StoreBackend::KeyValue);
        assert_eq!(
            config.store.resolved_path().unwrap(),
            PathBuf::from("/tmp/storage.json")
        );
        assert_eq!(config.ai.backend, AiBackendKind::Ollama);
        assert_eq!(config.ai.host, "http://10.0.0.5:11434");
        assert_eq!(config.ai.timeout, Duration::from_secs(45));
        assert_eq!(config.pipeline.strategy, ExecutionStrategy::Concurrent);
    }

    #[test]
    fn test_unknown_backend_is_error() {
        let err = parse_config("[ai]\nbackend = \"skynet\"\n", None).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(parse_config("[ai]\ntimeout_secs = 0\n", None).is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(parse_config("[ai]\nhots = \"typo\"\n", None).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::defaults().unwrap();
        let env: HashMap<&str, &str> = [
            ("MINDLINK_STORE_BACKEND", "kv"),
            ("MINDLINK_STORE_PATH", "/data/ls.json"),
            ("MINDLINK_AI_BACKEND", "openai"),
            ("MINDLINK_AI_HOST", "http://localhost:8000"),
            ("MINDLINK_AI_API_KEY", "sk-test"),
            ("MINDLINK_AI_TIMEOUT_SECS", "5"),
            ("MINDLINK_PIPELINE_STRATEGY", "concurrent"),
        ]
        .into_iter()
        .collect();

        config
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.store.backend, StoreBackend::KeyValue);
        assert_eq!(config.store.path, Some(PathBuf::from("/data/ls.json")));
        assert_eq!(config.ai.backend, AiBackendKind::OpenAICompatible);
        assert_eq!(config.ai.host, "http://localhost:8000");
        assert_eq!(config.ai.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.ai.timeout, Duration::from_secs(5));
        assert_eq!(config.pipeline.strategy, ExecutionStrategy::Concurrent);
    }

    #[test]
    fn test_env_invalid_timeout() {
        let mut config = Config::defaults().unwrap();
        let result = config.apply_env(|k| {
            (k == "MINDLINK_AI_TIMEOUT_SECS").then(|| "soon".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let mut config = Config::defaults().unwrap();
        config.ai.api_key = Some("secret-value".into());
        let rendered = format!("{:?}", config.ai);
        assert!(!rendered.contains("secret-value"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_explicit_missing_path_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let result = Config::load(Some(&tmp.path().join("missing.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
