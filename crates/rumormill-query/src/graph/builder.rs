use rumormill_core::graph::KnowledgeGraph;

use super::model::*;

/// Copy the whole knowledge graph into a [`GraphView`].
pub fn build_view(graph: &KnowledgeGraph) -> GraphView {
    graph.read(|state| GraphView {
        nodes: state
            .nodes()
            .iter()
            .map(|n| ViewNode {
                id: n.id.clone(),
                node_type: n.node_type,
                label: n.name.clone(),
            })
            .collect(),
        edges: state
            .edges()
            .iter()
            .map(|e| ViewEdge {
                from: e.source_id.clone(),
                to: e.target_id.clone(),
                edge_type: e.edge_type,
                weight: e.weight,
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rumormill_core::extract::RuleExtractor;
    use rumormill_core::graph::MemoryOptions;
    use std::sync::Arc;

    #[test]
    fn test_view_mirrors_stats() {
        let graph = KnowledgeGraph::in_memory(Arc::new(RuleExtractor::new()));
        graph.add_memory("guard", "Saw someone near the vault", MemoryOptions::default());
        let view = build_view(&graph);
        let stats = graph.stats();
        assert_eq!(view.nodes.len(), stats.total_nodes);
        assert_eq!(view.edges.len(), stats.total_edges);

        let around_guard = view.subgraph("npc:guard", 2);
        assert!(around_guard.nodes.iter().any(|n| n.id == "location:vault"));
    }
}
