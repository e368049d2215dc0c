use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::node::Properties;

/// Type of edge in the knowledge graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    Remembers,
    Mentions,
    Told,
    Knows,
    Witnessed,
    Suspects,
    LocatedAt,
    RelatedTo,
    HeardAbout,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::Remembers => "remembers",
            EdgeType::Mentions => "mentions",
            EdgeType::Told => "told",
            EdgeType::Knows => "knows",
            EdgeType::Witnessed => "witnessed",
            EdgeType::Suspects => "suspects",
            EdgeType::LocatedAt => "located_at",
            EdgeType::RelatedTo => "related_to",
            EdgeType::HeardAbout => "heard_about",
        }
    }

    /// Lenient parse used for generated extractions. Unknown kinds become `related_to`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "remembers" => EdgeType::Remembers,
            "mentions" => EdgeType::Mentions,
            "told" => EdgeType::Told,
            "knows" => EdgeType::Knows,
            "witnessed" => EdgeType::Witnessed,
            "suspects" => EdgeType::Suspects,
            "located_at" => EdgeType::LocatedAt,
            "heard_about" => EdgeType::HeardAbout,
            _ => EdgeType::RelatedTo,
        }
    }
}

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed, weighted edge. Several edges may join the same pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(rename = "source")]
    pub source_id: String,
    #[serde(rename = "target")]
    pub target_id: String,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: Properties,
    pub weight: f64,
    pub created_at: DateTime<Utc>,
}

impl Edge {
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>, edge_type: EdgeType) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            edge_type,
            properties: Properties::new(),
            weight: 1.0,
            created_at: Utc::now(),
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_property(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    /// String property lookup, e.g. the `content` of a `told` edge.
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(|v| v.as_str())
    }
}
