use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A memory as returned by retrieval. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub text: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub score: f64,
    #[serde(default)]
    pub entity_ids: Vec<String>,
    /// How this memory connects to the query.
    #[serde(default)]
    pub path_context: String,
}

/// Node/edge counts with per-type histograms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub node_types: BTreeMap<String, usize>,
    pub edge_types: BTreeMap<String, usize>,
}
