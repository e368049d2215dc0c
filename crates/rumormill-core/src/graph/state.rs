use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::model::{Edge, GraphStats, Node};

/// On-disk form of the graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub counter: u64,
}

/// Directed multigraph of nodes and edges with adjacency indexes.
///
/// Nodes and edges keep insertion order; the adjacency lists hold edge
/// positions in that order too, so every traversal is deterministic.
#[derive(Debug, Default)]
pub struct GraphState {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
    outgoing: HashMap<String, Vec<usize>>,
    incoming: HashMap<String, Vec<usize>>,
    counter: u64,
}

impl GraphState {
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Self {
        let mut state = Self {
            counter: snapshot.counter,
            ..Self::default()
        };
        for node in snapshot.nodes {
            state.insert_node(node);
        }
        for edge in snapshot.edges {
            state.insert_edge(edge);
        }
        state
    }

    pub fn to_snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            counter: self.counter,
        }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn out_edges<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.outgoing
            .get(id)
            .into_iter()
            .flatten()
            .map(move |&i| &self.edges[i])
    }

    pub fn in_edges<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.incoming
            .get(id)
            .into_iter()
            .flatten()
            .map(move |&i| &self.edges[i])
    }

    /// Number of memories ever allocated. Not reset by removals, only by `clear`.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    pub fn stats(&self) -> GraphStats {
        let mut node_types = BTreeMap::new();
        for node in &self.nodes {
            *node_types.entry(node.node_type.to_string()).or_insert(0) += 1;
        }
        let mut edge_types = BTreeMap::new();
        for edge in &self.edges {
            *edge_types.entry(edge.edge_type.to_string()).or_insert(0) += 1;
        }
        GraphStats {
            total_nodes: self.nodes.len(),
            total_edges: self.edges.len(),
            node_types,
            edge_types,
        }
    }

    pub(crate) fn next_counter(&mut self) -> u64 {
        self.counter += 1;
        self.counter
    }

    /// Insert a node unless one with the same id exists. Returns whether it was added.
    pub(crate) fn insert_node(&mut self, node: Node) -> bool {
        if self.index.contains_key(&node.id) {
            return false;
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        true
    }

    pub(crate) fn insert_edge(&mut self, edge: Edge) {
        let position = self.edges.len();
        self.outgoing
            .entry(edge.source_id.clone())
            .or_default()
            .push(position);
        self.incoming
            .entry(edge.target_id.clone())
            .or_default()
            .push(position);
        self.edges.push(edge);
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}
