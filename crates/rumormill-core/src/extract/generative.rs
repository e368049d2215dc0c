use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use super::provider::TextGenerator;
use super::rules::RuleExtractor;
use super::{Extraction, ExtractionContext, Extractor};
use crate::error::CoreError;
use crate::model::{entity_id, is_memory_id, Edge, EdgeType, Node, NodeType, Properties};

/// Extractor backed by a text generator that answers in JSON.
///
/// Every call is bounded by `timeout`. A failure, a timeout, or an
/// unparseable answer falls back to [`RuleExtractor`].
pub struct GenerativeExtractor {
    generator: Arc<dyn TextGenerator>,
    timeout: Duration,
    fallback: RuleExtractor,
}

impl GenerativeExtractor {
    pub fn new(generator: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self {
            generator,
            timeout,
            fallback: RuleExtractor::new(),
        }
    }

    fn try_extract(
        &self,
        text: &str,
        context: Option<&ExtractionContext>,
    ) -> Result<Extraction, CoreError> {
        let prompt = build_prompt(text, context)?;
        let answer = self.generate_bounded(prompt)?;
        parse_extraction(&answer)
    }

    /// Run the generator on a worker thread and stop waiting after `timeout`.
    fn generate_bounded(&self, prompt: String) -> Result<String, CoreError> {
        let (tx, rx) = mpsc::channel();
        let generator = Arc::clone(&self.generator);
        let timeout = self.timeout;
        thread::Builder::new()
            .name("rumormill-extract".into())
            .spawn(move || {
                let _ = tx.send(generator.generate(&prompt, timeout));
            })?;

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(CoreError::GenerationTimeout {
                timeout_ms: timeout.as_millis(),
            }),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(CoreError::Generation(
                "generator thread exited without a result".into(),
            )),
        }
    }
}

impl Extractor for GenerativeExtractor {
    fn extract(&self, text: &str, context: Option<&ExtractionContext>) -> Extraction {
        match self.try_extract(text, context) {
            Ok(extraction) => {
                debug!(
                    "Generated {} entities, {} relationships",
                    extraction.entities.len(),
                    extraction.relationships.len()
                );
                extraction
            }
            Err(e) => {
                warn!("Generative extraction failed: {e}, falling back to rules");
                self.fallback.extract(text, context)
            }
        }
    }

    fn name(&self) -> &'static str {
        "generative"
    }
}

fn build_prompt(text: &str, context: Option<&ExtractionContext>) -> Result<String, CoreError> {
    let context = match context {
        Some(ctx) if !ctx.is_empty() => serde_json::to_string(ctx)?,
        _ => "None".to_string(),
    };
    Ok(format!(
        r#"Extract entities and relationships from this dialogue in a medieval fantasy setting.

Text: {text:?}
Context: {context}

Return JSON with:
{{
  "entities": [
    {{"id": "type:name", "type": "npc|location|object|event|concept", "name": "...", "properties": {{}}}}
  ],
  "relationships": [
    {{"source": "entity_id", "target": "entity_id", "type": "knows|told|witnessed|suspects|related_to", "properties": {{}}}}
  ]
}}

Entity types: npc (characters), location (places), object (items), event (happenings), concept (ideas/rumors)
Relationship types: knows, told, witnessed, suspects, located_at, related_to, heard_about
Only return the JSON object, no other text."#
    ))
}

#[derive(Deserialize)]
struct RawExtraction {
    #[serde(default)]
    entities: Vec<RawEntity>,
    #[serde(default)]
    relationships: Vec<RawRelationship>,
}

#[derive(Deserialize)]
struct RawEntity {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default)]
    kind: String,
    name: String,
    #[serde(default)]
    properties: Properties,
}

#[derive(Deserialize)]
struct RawRelationship {
    source: String,
    target: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    properties: Properties,
}

/// Parse a generated answer, tolerating code fences and surrounding prose.
fn parse_extraction(answer: &str) -> Result<Extraction, CoreError> {
    let trimmed = answer.trim();
    let json_str = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(s), Some(e)) if e > s => &trimmed[s..=e],
        _ => return Err(CoreError::Parse("no JSON object found in response".into())),
    };
    let raw: RawExtraction = serde_json::from_str(json_str)?;

    let entities = raw
        .entities
        .into_iter()
        .filter(|e| !e.name.trim().is_empty())
        .map(|e| {
            let node_type = NodeType::parse_lenient(&e.kind);
            let id = if e.id.trim().is_empty() {
                entity_id(node_type, &e.name)
            } else {
                e.id.trim().to_lowercase()
            };
            let mut node = Node::entity(id, node_type, e.name);
            node.properties = e.properties;
            node
        })
        .filter(|node| !node.is_memory() && !is_memory_id(&node.id))
        .collect();

    let relationships = raw
        .relationships
        .into_iter()
        .map(|r| {
            let mut edge = Edge::new(
                r.source.trim().to_lowercase(),
                r.target.trim().to_lowercase(),
                EdgeType::parse_lenient(&r.kind),
            );
            edge.properties = r.properties;
            edge
        })
        .collect();

    Ok(Extraction {
        entities,
        relationships,
    })
}
