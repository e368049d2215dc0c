use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Free-form property map carried by nodes and edges.
pub type Properties = BTreeMap<String, serde_json::Value>;

/// Pseudo-agent whose memories are visible to every agent.
pub const GLOBAL_AGENT: &str = "global";

/// Type of node in the knowledge graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Npc,
    Location,
    Object,
    Event,
    Rumor,
    Concept,
    Memory,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Npc => "npc",
            NodeType::Location => "location",
            NodeType::Object => "object",
            NodeType::Event => "event",
            NodeType::Rumor => "rumor",
            NodeType::Concept => "concept",
            NodeType::Memory => "memory",
        }
    }

    /// Lenient parse used for generated extractions. Unknown kinds become concepts.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "npc" | "person" | "character" => NodeType::Npc,
            "location" | "place" => NodeType::Location,
            "object" | "item" => NodeType::Object,
            "event" => NodeType::Event,
            "rumor" => NodeType::Rumor,
            "memory" => NodeType::Memory,
            _ => NodeType::Concept,
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload specific to memory nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryData {
    pub text: String,
    pub agent_id: String,
    pub importance: f64,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A node in the knowledge graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: Properties,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryData>,
}

impl Node {
    /// An entity node (anything but a memory).
    pub fn entity(id: impl Into<String>, node_type: NodeType, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type,
            name: name.into(),
            properties: Properties::new(),
            created_at: Utc::now(),
            memory: None,
        }
    }

    pub fn with_property(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn is_memory(&self) -> bool {
        self.node_type == NodeType::Memory
    }

    pub fn importance(&self) -> f64 {
        self.memory.as_ref().map(|m| m.importance).unwrap_or(0.5)
    }
}

/// Node id of the agent that owns memories written for `agent_id`.
pub fn agent_node_id(agent_id: &str) -> String {
    format!("npc:{agent_id}")
}

/// Node id for the `seq`-th memory allocated in this graph.
pub fn memory_node_id(agent_id: &str, seq: u64) -> String {
    format!("memory:{agent_id}:{seq}")
}

/// Whether `id` lies in the namespace reserved for memory nodes.
pub fn is_memory_id(id: &str) -> bool {
    id.starts_with("memory:")
}

/// Derived id for an extracted entity: `type:lowercased-name`.
pub fn entity_id(node_type: NodeType, name: &str) -> String {
    format!("{}:{}", node_type.as_str(), name.trim().to_lowercase())
}

/// First `max` characters of `text`, on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
