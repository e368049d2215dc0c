use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::debug;

use rumormill_core::config::RetrievalConfig;
use rumormill_core::graph::{GraphState, KnowledgeGraph};
use rumormill_core::model::{agent_node_id, EdgeType, MemoryRecord, Node, GLOBAL_AGENT};

const HEARSAY_SCORE: f64 = 0.6;

/// Knobs for [`MemoryIndex::fetch_memories`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    pub limit: usize,
    pub include_global: bool,
    pub include_connections: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            limit: 4,
            include_global: true,
            include_connections: true,
        }
    }
}

impl From<&RetrievalConfig> for FetchOptions {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            limit: config.limit,
            include_global: config.include_global,
            include_connections: config.include_connections,
        }
    }
}

/// Relevance of a memory to a query, in `[0, 1]`.
///
/// Importance is the base; shared entities add up to 0.4, each extra hop
/// costs 0.1 and memories younger than 20 hours get a small recency bonus.
pub fn score_memory(importance: f64, overlap: usize, path_length: usize, age_hours: f64) -> f64 {
    let mut score = importance * 0.4;
    score += (overlap as f64 * 0.2).min(0.4);
    score -= path_length.saturating_sub(1) as f64 * 0.1;
    score += (0.2 - age_hours * 0.01).max(0.0);
    score.clamp(0.0, 1.0)
}

/// Ranked retrieval of an agent's memories about a topic.
pub struct MemoryIndex<'a> {
    graph: &'a KnowledgeGraph,
}

impl<'a> MemoryIndex<'a> {
    pub fn new(graph: &'a KnowledgeGraph) -> Self {
        Self { graph }
    }

    /// Memories `agent_id` can bring to a conversation about `topic`.
    ///
    /// Candidates come from three sources in order: the agent's own memories,
    /// memories reachable through entities named in the topic, and things
    /// other agents told this one. Ties keep that order.
    pub fn fetch_memories(&self, agent_id: &str, topic: &str, options: FetchOptions) -> Vec<MemoryRecord> {
        let extracted: Vec<String> = self
            .graph
            .extractor()
            .extract(topic, None)
            .entities
            .into_iter()
            .map(|e| e.id)
            .collect();
        let now = Utc::now();

        let mut memories = self.graph.read(|state| {
            let query = Query::new(state, agent_id, topic, extracted, now);
            let mut found = Vec::new();
            let mut seen = HashSet::new();
            query.direct(&mut found, &mut seen);
            if options.include_connections {
                query.connected(options.include_global, &mut found, &mut seen);
                query.hearsay(&mut found, &mut seen);
            }
            found
        });

        memories.sort_by(|a, b| b.score.total_cmp(&a.score));
        memories.truncate(options.limit);
        debug!(
            "Fetched {} memories for {agent_id} on {topic:?}",
            memories.len()
        );
        memories
    }
}

struct Query<'s> {
    state: &'s GraphState,
    agent_id: &'s str,
    agent_node: String,
    topic_lower: String,
    topic_entities: Vec<String>,
    now: DateTime<Utc>,
}

impl<'s> Query<'s> {
    fn new(
        state: &'s GraphState,
        agent_id: &'s str,
        topic: &str,
        extracted: Vec<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let topic_lower = topic.to_lowercase();
        let mut topic_entities = Vec::new();
        let mut seen = HashSet::new();
        for id in extracted {
            if seen.insert(id.clone()) {
                topic_entities.push(id);
            }
        }
        for node in state.nodes() {
            if node.is_memory() || node.name.is_empty() {
                continue;
            }
            if topic_lower.contains(&node.name.to_lowercase()) && seen.insert(node.id.clone()) {
                topic_entities.push(node.id.clone());
            }
        }
        Self {
            state,
            agent_id,
            agent_node: agent_node_id(agent_id),
            topic_lower,
            topic_entities,
            now,
        }
    }

    fn is_topic_entity(&self, id: &str) -> bool {
        self.topic_entities.iter().any(|t| t == id)
    }

    /// Any topic word longer than three characters appears in `text`.
    fn text_matches(&self, text: &str) -> bool {
        let text_lower = text.to_lowercase();
        self.topic_lower
            .split_whitespace()
            .filter(|w| w.chars().count() > 3)
            .any(|w| text_lower.contains(w))
    }

    fn score(&self, memory: &Node, overlap: usize, path_length: usize) -> f64 {
        let age_hours = (self.now - memory.created_at).num_seconds().max(0) as f64 / 3600.0;
        score_memory(memory.importance(), overlap, path_length, age_hours)
    }

    fn mentions(&self, memory_id: &str) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for edge in self.state.out_edges(memory_id) {
            if edge.edge_type == EdgeType::Mentions && !ids.contains(&edge.target_id) {
                ids.push(edge.target_id.clone());
            }
        }
        ids
    }

    fn direct(&self, found: &mut Vec<MemoryRecord>, seen: &mut HashSet<String>) {
        for edge in self.state.out_edges(&self.agent_node) {
            if edge.edge_type != EdgeType::Remembers {
                continue;
            }
            let Some(memory) = self.state.node(&edge.target_id) else {
                continue;
            };
            let Some(data) = memory.memory.as_ref() else {
                continue;
            };

            let mentioned = self.mentions(&memory.id);
            let overlap: Vec<&str> = mentioned
                .iter()
                .filter(|id| self.is_topic_entity(id))
                .map(String::as_str)
                .collect();
            if overlap.is_empty() && !self.text_matches(&data.text) {
                continue;
            }
            if !seen.insert(memory.id.clone()) {
                continue;
            }

            let path_context = if overlap.is_empty() {
                "Direct memory (text match)".to_string()
            } else {
                format!("Direct memory about: {}", overlap.join(", "))
            };
            let mut metadata = BTreeMap::new();
            metadata.insert("agent_id".into(), json!(self.agent_id));
            metadata.insert("importance".into(), json!(data.importance));
            metadata.insert("tags".into(), json!(data.tags.join(",")));

            found.push(MemoryRecord {
                text: data.text.clone(),
                metadata,
                score: self.score(memory, overlap.len(), 1),
                entity_ids: mentioned.clone(),
                path_context,
            });
        }
    }

    fn connected(&self, include_global: bool, found: &mut Vec<MemoryRecord>, seen: &mut HashSet<String>) {
        for entity_id in &self.topic_entities {
            for edge in self.state.in_edges(entity_id) {
                if edge.edge_type != EdgeType::Mentions {
                    continue;
                }
                let Some(memory) = self.state.node(&edge.source_id) else {
                    continue;
                };
                let Some(data) = memory.memory.as_ref() else {
                    continue;
                };
                let visible = data.agent_id == self.agent_id
                    || (include_global && data.agent_id == GLOBAL_AGENT);
                if !visible || !seen.insert(memory.id.clone()) {
                    continue;
                }

                let mut metadata = BTreeMap::new();
                metadata.insert("agent_id".into(), json!(data.agent_id));
                metadata.insert("importance".into(), json!(data.importance));

                found.push(MemoryRecord {
                    text: data.text.clone(),
                    metadata,
                    score: self.score(memory, 1, 2),
                    entity_ids: vec![entity_id.clone()],
                    path_context: format!("Connected through: {entity_id}"),
                });
            }
        }
    }

    fn hearsay(&self, found: &mut Vec<MemoryRecord>, seen: &mut HashSet<String>) {
        for edge in self.state.in_edges(&self.agent_node) {
            if edge.edge_type != EdgeType::Told {
                continue;
            }
            let Some(content) = edge.property_str("content").filter(|c| !c.is_empty()) else {
                continue;
            };
            if !self.text_matches(content) {
                continue;
            }
            let key = format!("told:{}:{}", edge.source_id, self.agent_node);
            if !seen.insert(key) {
                continue;
            }

            let source_name = self
                .state
                .node(&edge.source_id)
                .map(|n| n.name.clone())
                .unwrap_or_else(|| edge.source_id.clone());
            let mut metadata = BTreeMap::new();
            metadata.insert("source".into(), json!(source_name));
            metadata.insert("type".into(), json!("hearsay"));

            found.push(MemoryRecord {
                text: format!("Heard from {source_name}: {content}"),
                metadata,
                score: HEARSAY_SCORE,
                entity_ids: vec![edge.source_id.clone(), self.agent_node.clone()],
                path_context: format!("Told by {source_name}"),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rumormill_core::extract::{ExtractionContext, RuleExtractor};
    use rumormill_core::graph::MemoryOptions;
    use std::sync::Arc;

    fn graph() -> KnowledgeGraph {
        KnowledgeGraph::in_memory(Arc::new(RuleExtractor::new()))
    }

    fn limit(limit: usize) -> FetchOptions {
        FetchOptions {
            limit,
            ..Default::default()
        }
    }

    #[test]
    fn test_score_formula() {
        let fresh = score_memory(0.5, 1, 1, 0.0);
        assert!((fresh - 0.6).abs() < 1e-9);
        let old = score_memory(0.5, 1, 2, 100.0);
        assert!((old - 0.3).abs() < 1e-9);
        assert_eq!(score_memory(1.0, 10, 1, 0.0), 1.0);
        assert_eq!(score_memory(0.0, 0, 9, 500.0), 0.0);
    }

    #[test]
    fn test_guard_recalls_vault() {
        let graph = graph();
        graph.add_memory(
            "guard",
            "Saw someone near the vault",
            MemoryOptions::default().with_importance(0.9),
        );
        let memories = MemoryIndex::new(&graph).fetch_memories("guard", "vault door", limit(2));
        assert!(!memories.is_empty());
        assert!(memories[0].text.contains("vault"));
        assert_eq!(memories[0].path_context, "Direct memory about: location:vault");
        assert_eq!(memories[0].metadata["agent_id"], "guard");
    }

    #[test]
    fn test_text_match_without_entities() {
        let graph = graph();
        graph.add_memory("iris", "The lanterns flicker strangely tonight", MemoryOptions::default());
        let memories =
            MemoryIndex::new(&graph).fetch_memories("iris", "why do lanterns flicker", FetchOptions::default());
        assert_eq!(memories.len(), 1);
        assert_eq!(memories[0].path_context, "Direct memory (text match)");
    }

    #[test]
    fn test_global_memories_via_connections() {
        let graph = graph();
        graph.add_memory(GLOBAL_AGENT, "Mara heard: bells rang at the temple", MemoryOptions::default());
        graph.add_memory("theron", "Kel hid the ledger", MemoryOptions::default());

        let index = MemoryIndex::new(&graph);
        let with_global = index.fetch_memories("rylan", "the temple", FetchOptions::default());
        assert_eq!(with_global.len(), 1);
        assert_eq!(with_global[0].path_context, "Connected through: location:temple");
        assert_eq!(with_global[0].metadata["agent_id"], GLOBAL_AGENT);

        let without = index.fetch_memories(
            "rylan",
            "the temple",
            FetchOptions {
                include_global: false,
                ..Default::default()
            },
        );
        assert!(without.is_empty());

        // Another agent's private memory stays private.
        assert!(index.fetch_memories("rylan", "the ledger", FetchOptions::default()).is_empty());
    }

    #[test]
    fn test_hearsay_once_per_source() {
        let graph = graph();
        let told = MemoryOptions::default().with_context(ExtractionContext::conversation("suna", "mara"));
        graph.add_memory("suna", "smugglers crowd the harbor tonight", told.clone());
        graph.add_memory("suna", "smugglers again at the harbor", told);

        let memories = MemoryIndex::new(&graph).fetch_memories(
            "mara",
            "smugglers",
            FetchOptions::default(),
        );
        let hearsay: Vec<_> = memories
            .iter()
            .filter(|m| m.metadata.get("type") == Some(&json!("hearsay")))
            .collect();
        assert_eq!(hearsay.len(), 1);
        assert_eq!(hearsay[0].text, "Heard from suna: smugglers crowd the harbor tonight");
        assert_eq!(hearsay[0].score, 0.6);
        assert_eq!(hearsay[0].path_context, "Told by suna");
    }

    #[test]
    fn test_hearsay_after_reopen() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("graph.json");
        {
            let graph = KnowledgeGraph::open(&path, Arc::new(RuleExtractor::new()));
            graph.add_memory(
                "suna",
                "smugglers crowd the harbor tonight",
                MemoryOptions::default().with_context(ExtractionContext::conversation("suna", "mara")),
            );
        }

        let graph = KnowledgeGraph::open(&path, Arc::new(RuleExtractor::new()));
        let memories = MemoryIndex::new(&graph).fetch_memories(
            "mara",
            "smugglers",
            FetchOptions::default(),
        );
        let hearsay: Vec<_> = memories
            .iter()
            .filter(|m| m.metadata.get("type") == Some(&json!("hearsay")))
            .collect();
        assert_eq!(hearsay.len(), 1);
        assert_eq!(hearsay[0].text, "Heard from suna: smugglers crowd the harbor tonight");
    }

    #[test]
    fn test_no_connections_only_direct() {
        let graph = graph();
        graph.add_memory(GLOBAL_AGENT, "the market is busy", MemoryOptions::default());
        let memories = MemoryIndex::new(&graph).fetch_memories(
            "kel",
            "market",
            FetchOptions {
                include_connections: false,
                ..Default::default()
            },
        );
        assert!(memories.is_empty());
    }

    #[test]
    fn test_limit_and_score_bounds() {
        let graph = graph();
        for i in 0..10 {
            graph.add_memory(
                "bard",
                &format!("verse {i} about the harbor and the docks"),
                MemoryOptions::default().with_importance(i as f64 / 9.0),
            );
        }
        for n in [0, 1, 3, 20] {
            let memories = MemoryIndex::new(&graph).fetch_memories("bard", "harbor docks", limit(n));
            assert!(memories.len() <= n);
            for m in &memories {
                assert!((0.0..=1.0).contains(&m.score));
            }
            assert!(memories.windows(2).all(|w| w[0].score >= w[1].score));
        }
    }

    #[test]
    fn test_ties_keep_discovery_order() {
        let graph = graph();
        graph.add_memory("kel", "first look at the alley", MemoryOptions::default());
        graph.add_memory("kel", "second look at the alley", MemoryOptions::default());
        let memories = MemoryIndex::new(&graph).fetch_memories("kel", "alley", FetchOptions::default());
        assert_eq!(memories.len(), 2);
        if memories[0].score == memories[1].score {
            assert!(memories[0].text.starts_with("first"));
        }
    }

    #[test]
    fn test_unknown_agent_gets_nothing() {
        let graph = graph();
        assert!(MemoryIndex::new(&graph)
            .fetch_memories("nobody", "anything at all", FetchOptions::default())
            .is_empty());
    }
}
