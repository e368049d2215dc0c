use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use rumormill_core::model::{EdgeType, NodeType};

/// A node in an exported view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewNode {
    pub id: String,
    pub node_type: NodeType,
    pub label: String,
}

/// An edge in an exported view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewEdge {
    pub from: String,
    pub to: String,
    pub edge_type: EdgeType,
    pub weight: f64,
}

/// Detached copy of (part of) the knowledge graph for display.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphView {
    pub nodes: Vec<ViewNode>,
    pub edges: Vec<ViewEdge>,
}

impl GraphView {
    /// Extract a subgraph centered on a node, following edges either way.
    pub fn subgraph(&self, center_id: &str, depth: usize) -> GraphView {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back((center_id.to_string(), 0));
        visited.insert(center_id.to_string());

        while let Some((current, d)) = queue.pop_front() {
            if d >= depth {
                continue;
            }
            for edge in &self.edges {
                let neighbor = if edge.from == current {
                    &edge.to
                } else if edge.to == current {
                    &edge.from
                } else {
                    continue;
                };
                if visited.insert(neighbor.clone()) {
                    queue.push_back((neighbor.clone(), d + 1));
                }
            }
        }

        let nodes: Vec<ViewNode> = self
            .nodes
            .iter()
            .filter(|n| visited.contains(&n.id))
            .cloned()
            .collect();
        let edges: Vec<ViewEdge> = self
            .edges
            .iter()
            .filter(|e| visited.contains(&e.from) && visited.contains(&e.to))
            .cloned()
            .collect();

        GraphView { nodes, edges }
    }

    /// Render as DOT format for Graphviz.
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph rumormill {\n  rankdir=LR;\n");

        for node in &self.nodes {
            let shape = match node.node_type {
                NodeType::Npc => "diamond",
                NodeType::Memory => "note",
                NodeType::Location => "house",
                NodeType::Object => "box",
                NodeType::Event => "octagon",
                NodeType::Rumor | NodeType::Concept => "ellipse",
            };
            dot.push_str(&format!(
                "  \"{}\" [label=\"{}\" shape={}];\n",
                escape(&node.id),
                escape(&node.label),
                shape
            ));
        }

        for edge in &self.edges {
            dot.push_str(&format!(
                "  \"{}\" -> \"{}\" [label=\"{}\"];\n",
                escape(&edge.from),
                escape(&edge.to),
                edge.edge_type
            ));
        }

        dot.push_str("}\n");
        dot
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, node_type: NodeType) -> ViewNode {
        ViewNode {
            id: id.into(),
            node_type,
            label: id.into(),
        }
    }

    fn edge(from: &str, to: &str, edge_type: EdgeType) -> ViewEdge {
        ViewEdge {
            from: from.into(),
            to: to.into(),
            edge_type,
            weight: 1.0,
        }
    }

    fn chain() -> GraphView {
        GraphView {
            nodes: vec![
                node("npc:kel", NodeType::Npc),
                node("memory:kel:1", NodeType::Memory),
                node("object:ledger", NodeType::Object),
                node("memory:iris:2", NodeType::Memory),
            ],
            edges: vec![
                edge("npc:kel", "memory:kel:1", EdgeType::Remembers),
                edge("memory:kel:1", "object:ledger", EdgeType::Mentions),
                edge("memory:iris:2", "object:ledger", EdgeType::Mentions),
            ],
        }
    }

    #[test]
    fn test_subgraph_follows_both_directions() {
        let sub = chain().subgraph("object:ledger", 1);
        let ids: Vec<_> = sub.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["memory:kel:1", "object:ledger", "memory:iris:2"]);
        assert_eq!(sub.edges.len(), 2);
    }

    #[test]
    fn test_dot_escapes_labels() {
        let mut view = chain();
        view.nodes[1].label = "he said \"run\"".into();
        let dot = view.to_dot();
        assert!(dot.starts_with("digraph rumormill {"));
        assert!(dot.contains("he said \\\"run\\\""));
        assert!(dot.contains("\"npc:kel\" -> \"memory:kel:1\" [label=\"remembers\"]"));
    }
}
