use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::state::{GraphSnapshot, GraphState};
use crate::extract::{ExtractionContext, Extractor};
use crate::model::{
    agent_node_id, is_memory_id, memory_node_id, truncate_chars, Edge, EdgeType, GraphStats,
    MemoryData, Node, NodeType,
};
use crate::storage::SnapshotFile;

const DEFAULT_IMPORTANCE: f64 = 0.5;
const MENTION_WEIGHT: f64 = 0.5;
const SEED_IMPORTANCE: f64 = 0.8;
const MEMORY_LABEL_CHARS: usize = 40;

/// Optional arguments to [`KnowledgeGraph::add_memory`].
#[derive(Debug, Clone)]
pub struct MemoryOptions {
    pub tags: Vec<String>,
    pub importance: f64,
    pub context: Option<ExtractionContext>,
}

impl Default for MemoryOptions {
    fn default() -> Self {
        Self {
            tags: Vec::new(),
            importance: DEFAULT_IMPORTANCE,
            context: None,
        }
    }
}

impl MemoryOptions {
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_importance(mut self, importance: f64) -> Self {
        self.importance = importance;
        self
    }

    pub fn with_context(mut self, context: ExtractionContext) -> Self {
        self.context = Some(context);
        self
    }
}

/// Shared memory graph for all agents.
///
/// One mutex guards the graph; each mutating call extracts first, then
/// applies its changes and flushes the snapshot under that lock.
pub struct KnowledgeGraph {
    state: Mutex<GraphState>,
    extractor: Arc<dyn Extractor>,
    snapshot: Option<SnapshotFile>,
}

impl KnowledgeGraph {
    /// Open a graph persisted at `path`. An unreadable snapshot starts empty.
    pub fn open(path: impl Into<PathBuf>, extractor: Arc<dyn Extractor>) -> Self {
        let snapshot = SnapshotFile::new(path);
        let state = match snapshot.load::<GraphSnapshot>() {
            Ok(Some(data)) => {
                let state = GraphState::from_snapshot(data);
                info!(
                    "Loaded graph with {} nodes, {} edges",
                    state.nodes().len(),
                    state.edges().len()
                );
                state
            }
            Ok(None) => GraphState::default(),
            Err(e) => {
                warn!(
                    "Failed to load graph from {}: {e}",
                    snapshot.path().display()
                );
                GraphState::default()
            }
        };
        Self {
            state: Mutex::new(state),
            extractor,
            snapshot: Some(snapshot),
        }
    }

    /// A graph that is never written to disk.
    pub fn in_memory(extractor: Arc<dyn Extractor>) -> Self {
        Self {
            state: Mutex::new(GraphState::default()),
            extractor,
            snapshot: None,
        }
    }

    pub fn extractor(&self) -> &dyn Extractor {
        self.extractor.as_ref()
    }

    pub fn snapshot(&self) -> Option<&SnapshotFile> {
        self.snapshot.as_ref()
    }

    /// Run `f` against a consistent view of the graph.
    pub fn read<R>(&self, f: impl FnOnce(&GraphState) -> R) -> R {
        f(&self.state.lock())
    }

    /// Record a memory for `agent_id` and link it to everything it mentions.
    pub fn add_memory(&self, agent_id: &str, text: &str, options: MemoryOptions) -> String {
        let extraction = self.extractor.extract(text, options.context.as_ref());
        let importance = normalize_importance(options.importance);

        let mut state = self.state.lock();
        let memory_id = memory_node_id(agent_id, state.next_counter());

        let mut memory = Node::entity(
            memory_id.clone(),
            NodeType::Memory,
            truncate_chars(text, MEMORY_LABEL_CHARS),
        );
        memory.memory = Some(MemoryData {
            text: text.to_string(),
            agent_id: agent_id.to_string(),
            importance,
            tags: options.tags,
        });
        if !state.insert_node(memory) {
            warn!("{memory_id} already exists; memory not recorded");
            return memory_id;
        }

        let owner = agent_node_id(agent_id);
        if !state.contains(&owner) {
            state.insert_node(Node::entity(owner.clone(), NodeType::Npc, agent_id));
        }
        state.insert_edge(Edge::new(owner, memory_id.clone(), EdgeType::Remembers).with_weight(importance));

        // Memory ids are only ever allocated above.
        let entities = extraction
            .entities
            .into_iter()
            .filter(|e| !e.is_memory() && !is_memory_id(&e.id));
        for entity in entities {
            let entity_id = entity.id.clone();
            state.insert_node(entity);
            state.insert_edge(
                Edge::new(memory_id.clone(), entity_id, EdgeType::Mentions).with_weight(MENTION_WEIGHT),
            );
        }

        for relationship in extraction.relationships {
            if state.contains(&relationship.source_id) && state.contains(&relationship.target_id) {
                state.insert_edge(relationship);
            }
        }

        debug!("Added {memory_id} ({} nodes total)", state.nodes().len());
        self.persist(&state);
        memory_id
    }

    /// Add each entry as an important memory of `agent_id`.
    pub fn seed<I, S>(&self, agent_id: &str, entries: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        entries
            .into_iter()
            .map(|text| {
                self.add_memory(
                    agent_id,
                    text.as_ref(),
                    MemoryOptions::default().with_importance(SEED_IMPORTANCE),
                )
            })
            .collect()
    }

    /// Drop every node and edge and persist the empty graph.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.clear();
        info!("Graph reset");
        self.persist(&state);
    }

    pub fn stats(&self) -> GraphStats {
        self.state.lock().stats()
    }

    fn persist(&self, state: &GraphState) {
        let Some(snapshot) = &self.snapshot else {
            return;
        };
        if let Err(e) = snapshot.save(&state.to_snapshot()) {
            warn!("Failed to persist graph to {}: {e}", snapshot.path().display());
        }
    }
}

/// Clamp into `[0, 1]`; non-finite values take the default.
fn normalize_importance(importance: f64) -> f64 {
    if importance.is_finite() {
        importance.clamp(0.0, 1.0)
    } else {
        DEFAULT_IMPORTANCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{Extraction, RuleExtractor};
    use tempfile::TempDir;

    fn graph() -> KnowledgeGraph {
        KnowledgeGraph::in_memory(Arc::new(RuleExtractor::new()))
    }

    fn remembers_into(state: &GraphState, memory_id: &str) -> Vec<String> {
        state
            .in_edges(memory_id)
            .filter(|e| e.edge_type == EdgeType::Remembers)
            .map(|e| e.source_id.clone())
            .collect()
    }

    #[test]
    fn test_add_memory_links_owner_and_entities() {
        let graph = graph();
        let id = graph.add_memory(
            "guard",
            "Saw someone near the vault at midnight",
            MemoryOptions::default().with_tags(["patrol"]),
        );
        assert_eq!(id, "memory:guard:1");

        graph.read(|state| {
            let memory = state.node(&id).unwrap();
            let data = memory.memory.as_ref().unwrap();
            assert_eq!(data.agent_id, "guard");
            assert_eq!(data.importance, 0.5);
            assert_eq!(data.tags, vec!["patrol".to_string()]);

            assert_eq!(remembers_into(state, &id), vec!["npc:guard".to_string()]);
            let mentions: Vec<_> = state
                .out_edges(&id)
                .filter(|e| e.edge_type == EdgeType::Mentions)
                .map(|e| e.target_id.as_str())
                .collect();
            assert_eq!(mentions, vec!["location:vault"]);
        });
    }

    #[test]
    fn test_every_memory_has_one_remembers_edge() {
        let graph = graph();
        let ids = [
            graph.add_memory("mara", "Mara told Rylan about the docks", MemoryOptions::default()),
            graph.add_memory("mara", "the vault door was ajar", MemoryOptions::default()),
            graph.add_memory("rylan", "Mara is nervous", MemoryOptions::default()),
        ];
        graph.read(|state| {
            for id in &ids {
                assert_eq!(remembers_into(state, id).len(), 1, "{id}");
            }
            assert_eq!(state.node("npc:mara").unwrap().name, "mara");
            assert!(state.contains("npc:rylan"));
        });
    }

    #[test]
    fn test_importance_is_clamped() {
        let graph = graph();
        let high = graph.add_memory("kel", "x", MemoryOptions::default().with_importance(3.0));
        let low = graph.add_memory("kel", "y", MemoryOptions::default().with_importance(-1.0));
        graph.read(|state| {
            assert_eq!(state.node(&high).unwrap().importance(), 1.0);
            assert_eq!(state.node(&low).unwrap().importance(), 0.0);
        });
    }

    #[test]
    fn test_context_produces_told_edge() {
        let graph = graph();
        graph.add_memory(
            "suna",
            "The vault door was left ajar",
            MemoryOptions::default().with_context(ExtractionContext::conversation("suna", "mara")),
        );
        graph.read(|state| {
            let told: Vec<_> = state
                .in_edges("npc:mara")
                .filter(|e| e.edge_type == EdgeType::Told)
                .collect();
            assert_eq!(told.len(), 1);
            assert_eq!(told[0].source_id, "npc:suna");
        });
    }

    #[test]
    fn test_node_count_is_monotonic_until_reset() {
        let graph = graph();
        let mut last = 0;
        for i in 0..5 {
            graph.add_memory("iris", &format!("note {i} about the market"), MemoryOptions::default());
            let total = graph.stats().total_nodes;
            assert!(total >= i + 1);
            assert!(total >= last);
            last = total;
        }
        graph.reset();
        let stats = graph.stats();
        assert_eq!(stats.total_nodes, 0);
        assert_eq!(stats.total_edges, 0);
        assert_eq!(
            graph.add_memory("iris", "fresh start", MemoryOptions::default()),
            "memory:iris:1"
        );
    }

    #[test]
    fn test_seed_uses_high_importance() {
        let graph = graph();
        let ids = graph.seed("bard", ["a song about the harbor", "the temple bells"]);
        assert_eq!(ids.len(), 2);
        graph.read(|state| {
            for id in &ids {
                assert_eq!(state.node(id).unwrap().importance(), 0.8);
            }
        });
    }

    #[test]
    fn test_persists_and_reloads() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("graph.json");
        let before = {
            let graph = KnowledgeGraph::open(&path, Arc::new(RuleExtractor::new()));
            graph.add_memory("guard", "the vault", MemoryOptions::default());
            graph.add_memory("guard", "the docks", MemoryOptions::default());
            graph.stats()
        };

        let graph = KnowledgeGraph::open(&path, Arc::new(RuleExtractor::new()));
        assert_eq!(graph.stats(), before);
        assert_eq!(
            graph.add_memory("guard", "again", MemoryOptions::default()),
            "memory:guard:3"
        );
    }

    #[test]
    fn test_non_finite_importance_uses_default() {
        let graph = graph();
        let nan = graph.add_memory("kel", "x", MemoryOptions::default().with_importance(f64::NAN));
        let inf = graph.add_memory("kel", "y", MemoryOptions::default().with_importance(f64::INFINITY));
        graph.read(|state| {
            for id in [&nan, &inf] {
                assert_eq!(state.node(id).unwrap().importance(), 0.5);
                let weight = state.in_edges(id).next().unwrap().weight;
                assert_eq!(weight, 0.5);
            }
        });
    }

    #[test]
    fn test_nan_importance_survives_reload() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("graph.json");
        let before = {
            let graph = KnowledgeGraph::open(&path, Arc::new(RuleExtractor::new()));
            graph.add_memory("guard", "the vault", MemoryOptions::default());
            graph.add_memory(
                "guard",
                "the docks",
                MemoryOptions::default().with_importance(f64::NAN),
            );
            graph.stats()
        };
        assert!(before.total_nodes > 0);

        let graph = KnowledgeGraph::open(&path, Arc::new(RuleExtractor::new()));
        assert_eq!(graph.stats(), before);
    }

    struct Squatter;

    impl Extractor for Squatter {
        fn extract(&self, _text: &str, _context: Option<&ExtractionContext>) -> Extraction {
            Extraction {
                entities: vec![
                    Node::entity("memory:kel:2", NodeType::Concept, "squatter"),
                    Node::entity("memory:stray", NodeType::Memory, "stray"),
                    Node::entity("location:docks", NodeType::Location, "docks"),
                ],
                relationships: Vec::new(),
            }
        }

        fn name(&self) -> &'static str {
            "squatter"
        }
    }

    #[test]
    fn test_extracted_entities_cannot_take_memory_ids() {
        let graph = KnowledgeGraph::in_memory(Arc::new(Squatter));
        let first = graph.add_memory("kel", "crates at the docks", MemoryOptions::default());
        let second = graph.add_memory("kel", "more crates", MemoryOptions::default());
        assert_eq!(second, "memory:kel:2");

        graph.read(|state| {
            for id in [&first, &second] {
                let node = state.node(id).unwrap();
                assert!(node.is_memory());
                assert_eq!(remembers_into(state, id), vec!["npc:kel".to_string()]);
            }
            assert!(!state.contains("memory:stray"));
            assert_eq!(state.stats().node_types.get("memory"), Some(&2));
        });
    }

    #[test]
    fn test_reload_keeps_edge_properties() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("graph.json");
        let (nodes, edges) = {
            let graph = KnowledgeGraph::open(&path, Arc::new(RuleExtractor::new()));
            graph.add_memory(
                "suna",
                "Smugglers crowd the harbor tonight",
                MemoryOptions::default()
                    .with_tags(["harbor"])
                    .with_context(ExtractionContext::conversation("suna", "mara")),
            );
            graph.read(|state| (state.nodes().to_vec(), state.edges().to_vec()))
        };

        let graph = KnowledgeGraph::open(&path, Arc::new(RuleExtractor::new()));
        graph.read(|state| {
            assert_eq!(state.nodes(), nodes.as_slice());
            assert_eq!(state.edges(), edges.as_slice());
            let told = state
                .in_edges("npc:mara")
                .find(|e| e.edge_type == EdgeType::Told)
                .unwrap();
            assert_eq!(
                told.property_str("content"),
                Some("Smugglers crowd the harbor tonight")
            );
        });
    }

    #[test]
    fn test_corrupt_snapshot_starts_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("graph.json");
        std::fs::write(&path, "garbage").unwrap();
        let graph = KnowledgeGraph::open(&path, Arc::new(RuleExtractor::new()));
        assert_eq!(graph.stats().total_nodes, 0);
    }
}
