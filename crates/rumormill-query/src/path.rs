use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use rumormill_core::graph::{GraphState, KnowledgeGraph};
use rumormill_core::model::{EdgeType, Node, NodeType};

/// One hop of a relationship path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    pub source: String,
    pub edge_type: EdgeType,
    pub target: String,
}

/// An outgoing relationship of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRef {
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    pub target: String,
    pub target_name: String,
}

/// A non-memory node reachable from an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectedEntity {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub distance: usize,
}

/// Neighbourhood of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityContext {
    pub entity: Node,
    pub relationships: Vec<RelationshipRef>,
    pub connected_entities: Vec<ConnectedEntity>,
}

/// Shortest-path and neighbourhood queries over the knowledge graph.
pub struct RelationshipPathFinder<'a> {
    graph: &'a KnowledgeGraph,
}

impl<'a> RelationshipPathFinder<'a> {
    pub fn new(graph: &'a KnowledgeGraph) -> Self {
        Self { graph }
    }

    /// Fewest-hop path along edge direction. Empty when either end is unknown,
    /// when they are the same node, or when no path exists.
    pub fn relationship_path(&self, source_id: &str, target_id: &str) -> Vec<PathStep> {
        self.graph
            .read(|state| shortest_path(state, source_id, target_id))
    }

    /// The entity, its outgoing relationships, and entities within `depth` hops.
    pub fn entity_context(&self, entity_id: &str, depth: usize) -> Option<EntityContext> {
        self.graph.read(|state| {
            let entity = state.node(entity_id)?.clone();
            let relationships = state
                .out_edges(entity_id)
                .filter(|e| e.edge_type != EdgeType::Remembers)
                .map(|e| RelationshipRef {
                    edge_type: e.edge_type,
                    target: e.target_id.clone(),
                    target_name: display_name(state, &e.target_id),
                })
                .collect();
            Some(EntityContext {
                entity,
                relationships,
                connected_entities: neighbourhood(state, entity_id, depth),
            })
        })
    }
}

fn display_name(state: &GraphState, id: &str) -> String {
    state
        .node(id)
        .map(|n| n.name.clone())
        .unwrap_or_else(|| id.to_string())
}

fn shortest_path(state: &GraphState, source_id: &str, target_id: &str) -> Vec<PathStep> {
    if source_id == target_id || !state.contains(source_id) || !state.contains(target_id) {
        return Vec::new();
    }

    let mut parent: HashMap<&str, &str> = HashMap::new();
    let mut visited: HashSet<&str> = HashSet::from([source_id]);
    let mut queue = VecDeque::from([source_id]);

    'search: while let Some(current) = queue.pop_front() {
        for edge in state.out_edges(current) {
            let next = edge.target_id.as_str();
            if visited.insert(next) {
                parent.insert(next, current);
                if next == target_id {
                    break 'search;
                }
                queue.push_back(next);
            }
        }
    }

    if !parent.contains_key(target_id) {
        return Vec::new();
    }

    let mut nodes = vec![target_id];
    let mut cursor = target_id;
    while let Some(&prev) = parent.get(cursor) {
        nodes.push(prev);
        cursor = prev;
    }
    nodes.reverse();

    nodes
        .windows(2)
        .filter_map(|pair| {
            state
                .out_edges(pair[0])
                .find(|e| e.target_id == pair[1])
                .map(|e| PathStep {
                    source: pair[0].to_string(),
                    edge_type: e.edge_type,
                    target: pair[1].to_string(),
                })
        })
        .collect()
}

fn neighbourhood(state: &GraphState, entity_id: &str, depth: usize) -> Vec<ConnectedEntity> {
    let mut connected = Vec::new();
    let mut visited: HashSet<&str> = HashSet::from([entity_id]);
    let mut queue = VecDeque::from([(entity_id, 0usize)]);

    while let Some((current, d)) = queue.pop_front() {
        if d >= depth {
            continue;
        }
        for edge in state.out_edges(current) {
            let neighbor = edge.target_id.as_str();
            if !visited.insert(neighbor) {
                continue;
            }
            if let Some(node) = state.node(neighbor) {
                if !node.is_memory() {
                    connected.push(ConnectedEntity {
                        id: node.id.clone(),
                        name: node.name.clone(),
                        node_type: node.node_type,
                        distance: d + 1,
                    });
                }
            }
            queue.push_back((neighbor, d + 1));
        }
    }
    connected
}

#[cfg(test)]
mod tests {
    use super::*;
    use rumormill_core::extract::{ExtractionContext, RuleExtractor};
    use rumormill_core::graph::MemoryOptions;
    use std::sync::Arc;

    fn town() -> KnowledgeGraph {
        let graph = KnowledgeGraph::in_memory(Arc::new(RuleExtractor::new()));
        graph.add_memory("guard", "Saw someone near the vault", MemoryOptions::default());
        graph.add_memory(
            "suna",
            "the vault door was left ajar",
            MemoryOptions::default().with_context(ExtractionContext::conversation("suna", "mara")),
        );
        graph
    }

    #[test]
    fn test_path_through_memory() {
        let graph = town();
        let path = RelationshipPathFinder::new(&graph).relationship_path("npc:guard", "location:vault");
        assert_eq!(
            path,
            vec![
                PathStep {
                    source: "npc:guard".into(),
                    edge_type: EdgeType::Remembers,
                    target: "memory:guard:1".into(),
                },
                PathStep {
                    source: "memory:guard:1".into(),
                    edge_type: EdgeType::Mentions,
                    target: "location:vault".into(),
                },
            ]
        );
    }

    #[test]
    fn test_direct_told_edge_is_one_hop() {
        let graph = town();
        let path = RelationshipPathFinder::new(&graph).relationship_path("npc:suna", "npc:mara");
        assert_eq!(path.len(), 1);
        assert_eq!(path[0].edge_type, EdgeType::Told);
    }

    #[test]
    fn test_no_path_is_empty() {
        let graph = town();
        let finder = RelationshipPathFinder::new(&graph);
        // Edges only point away from agents.
        assert!(finder.relationship_path("location:vault", "npc:guard").is_empty());
        assert!(finder.relationship_path("npc:guard", "npc:mara").is_empty());
        assert!(finder.relationship_path("npc:guard", "npc:ghost").is_empty());
        assert!(finder.relationship_path("npc:guard", "npc:guard").is_empty());
    }

    #[test]
    fn test_entity_context() {
        let graph = town();
        let finder = RelationshipPathFinder::new(&graph);
        let ctx = finder.entity_context("npc:suna", 2).unwrap();
        assert_eq!(ctx.entity.id, "npc:suna");

        // remembers edges are excluded, the told edge is kept
        assert_eq!(ctx.relationships.len(), 1);
        assert_eq!(ctx.relationships[0].edge_type, EdgeType::Told);
        assert_eq!(ctx.relationships[0].target_name, "mara");

        let ids: Vec<_> = ctx.connected_entities.iter().map(|c| (c.id.as_str(), c.distance)).collect();
        assert!(ids.contains(&("npc:mara", 1)));
        assert!(ids.contains(&("location:vault", 2)));
        assert!(!ids.iter().any(|(id, _)| id.starts_with("memory:")));
    }

    #[test]
    fn test_entity_context_depth_one() {
        let graph = town();
        let ctx = RelationshipPathFinder::new(&graph)
            .entity_context("npc:suna", 1)
            .unwrap();
        assert!(ctx.connected_entities.iter().all(|c| c.distance == 1));
        assert!(ctx.connected_entities.iter().any(|c| c.id == "npc:mara"));
    }

    #[test]
    fn test_unknown_entity_context() {
        let graph = town();
        assert!(RelationshipPathFinder::new(&graph)
            .entity_context("npc:ghost", 2)
            .is_none());
    }
}
