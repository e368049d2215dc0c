use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Top-level configuration, usually read from `rumormill.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RumormillConfig {
    /// Directory holding `graph.json` and `experiments.json`.
    pub data_dir: PathBuf,
    pub extraction: ExtractionConfig,
    pub retrieval: RetrievalConfig,
    pub propagation: PropagationConfig,
}

impl Default for RumormillConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".rumormill"),
            extraction: ExtractionConfig::default(),
            retrieval: RetrievalConfig::default(),
            propagation: PropagationConfig::default(),
        }
    }
}

impl RumormillConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, CoreError> {
        Ok(toml::from_str(content)?)
    }

    /// Render this configuration as TOML.
    pub fn to_toml(&self) -> Result<String, CoreError> {
        toml::to_string_pretty(self).map_err(|e| CoreError::Config(e.to_string()))
    }

    pub fn graph_path(&self) -> PathBuf {
        self.data_dir.join("graph.json")
    }

    pub fn experiments_path(&self) -> PathBuf {
        self.data_dir.join("experiments.json")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    Rules,
    Generative,
}

/// Entity extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub mode: ExtractionMode,
    /// Upper bound on a single generative extraction call.
    pub timeout_secs: u64,
    pub provider: ProviderConfig,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            mode: ExtractionMode::Rules,
            timeout_secs: 20,
            provider: ProviderConfig::default(),
        }
    }
}

impl ExtractionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub temperature: f32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".into(),
            model: "openai/gpt-4o-mini".into(),
            api_key_env: "OPENROUTER_API_KEY".into(),
            temperature: 0.3,
        }
    }
}

impl ProviderConfig {
    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

/// Defaults for `fetch_memories`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub limit: usize,
    pub include_global: bool,
    pub include_connections: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            limit: 4,
            include_global: true,
            include_connections: true,
        }
    }
}

/// Propagation detection knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagationConfig {
    /// Whether the turn facade feeds turns to the tracker.
    pub enabled: bool,
    /// A turn is a detection when its similarity is strictly above this.
    pub similarity_threshold: f64,
    /// ...or when at least this many secret keywords occur in it.
    pub min_keyword_matches: usize,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            similarity_threshold: 0.3,
            min_keyword_matches: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_file() {
        let config = RumormillConfig::from_str("").unwrap();
        assert_eq!(config.data_dir, PathBuf::from(".rumormill"));
        assert_eq!(config.extraction.mode, ExtractionMode::Rules);
        assert_eq!(config.retrieval.limit, 4);
        assert_eq!(config.propagation.similarity_threshold, 0.3);
        assert_eq!(config.propagation.min_keyword_matches, 2);
    }

    #[test]
    fn test_partial_sections() {
        let config = RumormillConfig::from_str(
            r#"
data_dir = "/tmp/town"

[extraction]
mode = "generative"
timeout_secs = 5

[retrieval]
limit = 8
"#,
        )
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/town"));
        assert_eq!(config.extraction.mode, ExtractionMode::Generative);
        assert_eq!(config.extraction.timeout(), Duration::from_secs(5));
        assert_eq!(config.extraction.provider.api_key_env, "OPENROUTER_API_KEY");
        assert_eq!(config.retrieval.limit, 8);
        assert!(config.retrieval.include_global);
        assert_eq!(config.graph_path(), PathBuf::from("/tmp/town/graph.json"));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = RumormillConfig::default();
        let text = config.to_toml().unwrap();
        let parsed = RumormillConfig::from_str(&text).unwrap();
        assert_eq!(parsed.retrieval.limit, config.retrieval.limit);
        assert_eq!(parsed.extraction.provider.model, config.extraction.provider.model);
    }

    #[test]
    fn test_invalid_mode_is_error() {
        let err = RumormillConfig::from_str("[extraction]\nmode = \"telepathy\"\n");
        assert!(err.is_err());
    }
}
