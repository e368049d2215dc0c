//! Entity and relationship extraction from dialogue text.
//!
//! Two interchangeable implementations sit behind [`Extractor`]:
//! [`RuleExtractor`] (lexical patterns, deterministic) and
//! [`GenerativeExtractor`] (asks a [`TextGenerator`] for JSON). The generative
//! one falls back to the rules on any failure or timeout, so `extract` is
//! always total.

pub mod generative;
pub mod provider;
pub mod rules;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{ExtractionConfig, ExtractionMode};
use crate::model::{Edge, Node};

pub use generative::GenerativeExtractor;
pub use provider::{OpenAiCompatClient, TextGenerator};
pub use rules::RuleExtractor;

/// Conversation participants for a piece of text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listener: Option<String>,
}

impl ExtractionContext {
    pub fn conversation(speaker: impl Into<String>, listener: impl Into<String>) -> Self {
        Self {
            speaker: Some(speaker.into()),
            listener: Some(listener.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.speaker.is_none() && self.listener.is_none()
    }
}

/// Candidate entities and relationships found in a text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub entities: Vec<Node>,
    pub relationships: Vec<Edge>,
}

impl Extraction {
    pub fn entity_ids(&self) -> impl Iterator<Item = &str> {
        self.entities.iter().map(|e| e.id.as_str())
    }
}

pub trait Extractor: Send + Sync {
    /// Extract entities and relationships. Never fails.
    fn extract(&self, text: &str, context: Option<&ExtractionContext>) -> Extraction;

    fn name(&self) -> &'static str;
}

/// Pick the extractor named by the configuration.
///
/// Generative mode without an API key degrades to rules.
pub fn build_extractor(config: &ExtractionConfig) -> Arc<dyn Extractor> {
    match config.mode {
        ExtractionMode::Rules => Arc::new(RuleExtractor::new()),
        ExtractionMode::Generative => match OpenAiCompatClient::from_config(&config.provider) {
            Some(client) => {
                tracing::info!(
                    "Using generative extraction via {} ({})",
                    config.provider.base_url,
                    config.provider.model
                );
                Arc::new(GenerativeExtractor::new(Arc::new(client), config.timeout()))
            }
            None => {
                tracing::warn!(
                    "{} is not set; using rule-based extraction",
                    config.provider.api_key_env
                );
                Arc::new(RuleExtractor::new())
            }
        },
    }
}
