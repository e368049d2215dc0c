use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::{Extraction, ExtractionContext, Extractor};
use crate::model::{entity_id, truncate_chars, Edge, EdgeType, Node, NodeType};

/// Entity lexicons, scanned in this order against lowercased text.
static ENTITY_PATTERNS: LazyLock<Vec<(NodeType, Vec<Regex>)>> = LazyLock::new(|| {
    let compile = |patterns: &[&str]| -> Vec<Regex> {
        patterns
            .iter()
            .map(|p| Regex::new(p).expect("entity pattern must compile"))
            .collect()
    };
    vec![
        (
            NodeType::Npc,
            compile(&[
                r"\b(mara|rylan|iris|theron|kel|suna)\b",
                r"\b(guard|shopkeeper|smuggler|bard|artificer|herbalist)\b",
                r"\b(captain|quartermaster|apothecary)\b",
            ]),
        ),
        (
            NodeType::Location,
            compile(&[
                r"\b(vault|sewers?|docks?|harbor|temple|market|alehouse|workshop|cellar)\b",
                r"\b(gate|aqueduct|tannery|alley)\b",
            ]),
        ),
        (
            NodeType::Object,
            compile(&[
                r"\b(coins?|silver|gold|ledger|key|door|bells?|shipment|crates?)\b",
                r"\b(iron|steel|ale|poppy|nightshade|tea)\b",
            ]),
        ),
        (
            NodeType::Event,
            compile(&[r"\b(rang|missing|stolen|spotted|slipping|vanished|ajar)\b"]),
        ),
    ]
});

/// Relationship phrases: (subject)(verb)(object).
static RELATIONSHIP_PATTERNS: LazyLock<Vec<(Regex, EdgeType)>> = LazyLock::new(|| {
    [
        (
            r"(\w+)\s+(?:told|said to|confided in|whispered to)\s+(\w+)",
            EdgeType::Told,
        ),
        (
            r"(\w+)\s+(?:saw|spotted|witnessed|noticed)\s+(.+)",
            EdgeType::Witnessed,
        ),
        (r"(\w+)\s+(?:suspects?|thinks?|believes?)\s+(.+)", EdgeType::Suspects),
        (r"(\w+)\s+(?:heard about|learned of)\s+(.+)", EdgeType::HeardAbout),
        (r"(\w+)\s+(?:knows?|knew)\s+(?:about\s+)?(.+)", EdgeType::Knows),
    ]
    .into_iter()
    .map(|(p, t)| (Regex::new(p).expect("relationship pattern must compile"), t))
    .collect()
});

const SOURCE_TEXT_CHARS: usize = 100;
const TOLD_CONTENT_CHARS: usize = 200;
const CAPTURE_CHARS: usize = 50;

/// Deterministic pattern-based extractor.
///
/// Relationship participants that cannot be resolved to an entity drop the
/// relationship silently.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleExtractor;

impl RuleExtractor {
    pub fn new() -> Self {
        Self
    }

    fn scan_entities(&self, text: &str, lower: &str, out: &mut Vec<Node>, seen: &mut HashSet<String>) {
        let source_text = truncate_chars(text, SOURCE_TEXT_CHARS);
        for (node_type, patterns) in ENTITY_PATTERNS.iter() {
            for pattern in patterns {
                for caps in pattern.captures_iter(lower) {
                    let matched = &caps[1];
                    let id = entity_id(*node_type, matched);
                    if seen.insert(id.clone()) {
                        let name = if *node_type == NodeType::Npc {
                            title_case(matched)
                        } else {
                            matched.to_string()
                        };
                        out.push(
                            Node::entity(id, *node_type, name)
                                .with_property("source_text", source_text.clone()),
                        );
                    }
                }
            }
        }
    }

    fn add_participants(
        &self,
        text: &str,
        context: &ExtractionContext,
        entities: &mut Vec<Node>,
        relationships: &mut Vec<Edge>,
        seen: &mut HashSet<String>,
    ) {
        let speaker_id = context
            .speaker
            .as_deref()
            .map(|s| entity_id(NodeType::Npc, s));
        let listener_id = context
            .listener
            .as_deref()
            .map(|l| entity_id(NodeType::Npc, l));

        for (id, name) in [
            (&speaker_id, context.speaker.as_deref()),
            (&listener_id, context.listener.as_deref()),
        ] {
            if let (Some(id), Some(name)) = (id, name) {
                if seen.insert(id.clone()) {
                    entities.push(Node::entity(id.clone(), NodeType::Npc, name));
                }
            }
        }

        if let (Some(speaker_id), Some(listener_id)) = (speaker_id, listener_id) {
            relationships.push(
                Edge::new(speaker_id, listener_id, EdgeType::Told)
                    .with_property("content", truncate_chars(text, TOLD_CONTENT_CHARS)),
            );
        }
    }

    /// Resolve a captured phrase to an entity id.
    ///
    /// First a substring match against entities already found in this text,
    /// then the entity lexicons applied to the phrase itself.
    fn resolve(&self, fragment: &str, known: &[String]) -> Option<String> {
        let needle = fragment.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        if let Some(id) = known.iter().find(|id| id.contains(&needle)) {
            return Some(id.clone());
        }
        ENTITY_PATTERNS.iter().find_map(|(node_type, patterns)| {
            patterns
                .iter()
                .find_map(|p| p.captures(&needle))
                .map(|caps| entity_id(*node_type, &caps[1]))
        })
    }
}

impl Extractor for RuleExtractor {
    fn extract(&self, text: &str, context: Option<&ExtractionContext>) -> Extraction {
        let lower = text.to_lowercase();
        let mut entities = Vec::new();
        let mut relationships = Vec::new();
        let mut seen = HashSet::new();

        self.scan_entities(text, &lower, &mut entities, &mut seen);

        if let Some(ctx) = context {
            self.add_participants(text, ctx, &mut entities, &mut relationships, &mut seen);
        }

        let known: Vec<String> = entities.iter().map(|e| e.id.clone()).collect();
        for (pattern, edge_type) in RELATIONSHIP_PATTERNS.iter() {
            for caps in pattern.captures_iter(&lower) {
                let source = &caps[1];
                let target = truncate_chars(&caps[2], CAPTURE_CHARS);
                if let (Some(source_id), Some(target_id)) =
                    (self.resolve(source, &known), self.resolve(&target, &known))
                {
                    relationships.push(Edge::new(source_id, target_id, *edge_type));
                }
            }
        }

        Extraction {
            entities,
            relationships,
        }
    }

    fn name(&self) -> &'static str {
        "rules"
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
