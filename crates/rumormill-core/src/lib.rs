//! Core data model, entity extraction and the shared knowledge graph store.
//!
//! The [`graph::KnowledgeGraph`] is the single writer boundary for agent
//! memories. Readers in `rumormill-query` go through [`graph::KnowledgeGraph::read`]
//! so they always observe whole `add_memory` calls.

pub mod config;
pub mod error;
pub mod extract;
pub mod graph;
pub mod model;
pub mod storage;

pub use config::RumormillConfig;
pub use error::CoreError;
pub use extract::{build_extractor, Extraction, ExtractionContext, Extractor, RuleExtractor};
pub use graph::{GraphState, KnowledgeGraph, MemoryOptions};
pub use model::{Edge, EdgeType, GraphStats, MemoryData, MemoryRecord, Node, NodeType};
