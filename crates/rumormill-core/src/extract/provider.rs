use std::fmt;
use std::time::Duration;

use crate::config::ProviderConfig;
use crate::error::CoreError;

/// Something that turns a prompt into text.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str, timeout: Duration) -> Result<String, CoreError>;
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiCompatClient {
    config: ProviderConfig,
    api_key: String,
}

impl OpenAiCompatClient {
    pub fn new(config: ProviderConfig, api_key: impl Into<String>) -> Self {
        Self {
            config,
            api_key: api_key.into(),
        }
    }

    /// Build a client when the configured key variable is set.
    pub fn from_config(config: &ProviderConfig) -> Option<Self> {
        config.api_key().map(|key| Self::new(config.clone(), key))
    }
}

impl fmt::Debug for OpenAiCompatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiCompatClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl TextGenerator for OpenAiCompatClient {
    fn generate(&self, prompt: &str, timeout: Duration) -> Result<String, CoreError> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();

        let body = serde_json::json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let resp = agent
            .post(&url)
            .set("Content-Type", "application/json")
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .send_string(&body.to_string())
            .map_err(|e: ureq::Error| CoreError::Generation(e.to_string()))?;

        let resp_str = resp
            .into_string()
            .map_err(|e| CoreError::Generation(e.to_string()))?;
        let json: serde_json::Value = serde_json::from_str(&resp_str)?;

        json["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| CoreError::Parse("missing 'choices[0].message.content'".into()))
    }
}
